#![forbid(unsafe_code)]

pub mod access;
pub mod app_services;
pub mod error;
pub mod question_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use access::{AccessPolicy, Role};
pub use app_services::AppServices;
pub use error::{AppServicesError, QuestionServiceError, SessionError};
pub use question_service::{ImportReport, QuestionService};

pub use sessions::{
    CategoryProgress, QuizSession, QuizSessionService, SessionProgress, SessionState, Submission,
    Ticker, VisibleQuestion,
};
