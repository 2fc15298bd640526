mod achievement;
mod character;
mod game_session;
mod ids;
mod progress;
mod user;

pub use achievement::{Achievement, AchievementKind, AchievementStatus};
pub use character::{Category, ChineseCharacter, Difficulty, DifficultyError, ParseCategoryError};
pub use game_session::GameSessionRecord;
pub use ids::{AchievementId, CharacterId, GameSessionId, ParseIdError, UserId};
pub use progress::UserProgress;
pub use user::{
    ANONYMOUS_NAME, ExternalProfile, GUEST_NAME, LevelChange, NewUser, User, UserError, UserUpdate,
};
