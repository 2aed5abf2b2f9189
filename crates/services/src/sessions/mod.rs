mod progress;
mod service;
mod ticker;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{CategoryProgress, SessionProgress};
pub use service::{QuizSession, SessionState};
pub use ticker::Ticker;
pub use view::{VisibleQuestion, option_label, parse_option};
pub use workflow::{QuizSessionService, Submission};
