use thiserror::Error;

use crate::model::{DifficultyError, ParseCategoryError, ParseIdError, UserError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    Category(#[from] ParseCategoryError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    User(#[from] UserError),
}
