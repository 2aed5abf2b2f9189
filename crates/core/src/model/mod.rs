mod ids;
mod question;
mod result;
mod settings;

pub use ids::{ParseIdError, QuestionId, SessionId, UserId};
pub use question::{Category, OPTION_COUNT, Question, QuestionDraft, QuestionError};
pub use result::{CategoryScore, EndReason, QuizResult, ScoreError, ScoreResult};
pub use settings::{QuizSettings, SettingsError};
