mod progress;
mod session;
mod workflow;

// Public API of the game subsystem.
pub use crate::error::{GameError, SessionError};
pub use progress::{AnswerOutcome, GameProgress, GameResults};
pub use session::{GamePhase, GameSession};
pub use workflow::{GameAnswerResult, GameLoopService, GameOptions};
