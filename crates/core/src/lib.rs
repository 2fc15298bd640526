#![forbid(unsafe_code)]

pub mod achievements;
pub mod catalog;
pub mod error;
pub mod model;
pub mod quiz;
pub mod rules;
pub mod scoring;
pub mod selection;
pub mod time;

pub use error::Error;
pub use rules::GameRules;
pub use time::Clock;
