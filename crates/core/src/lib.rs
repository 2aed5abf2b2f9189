#![forbid(unsafe_code)]

pub mod error;
pub mod ledger;
pub mod model;
pub mod pagination;
pub mod question_set;
pub mod scoring;
pub mod session_clock;
pub mod time;

pub use error::Error;
pub use ledger::AnswerLedger;
pub use question_set::QuestionSet;
pub use scoring::score;
pub use session_clock::{SessionClock, Tick, format_remaining};
pub use time::Clock;
