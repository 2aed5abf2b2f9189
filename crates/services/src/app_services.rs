use std::sync::Arc;

use quiz_core::model::{QuizSettings, UserId};
use storage::repository::Storage;

use crate::Clock;
use crate::access::{AccessPolicy, Role};
use crate::error::AppServicesError;
use crate::question_service::QuestionService;
use crate::sessions::QuizSessionService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    access: Arc<AccessPolicy>,
    sessions: Arc<QuizSessionService>,
    questions: Arc<QuestionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
        access: AccessPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings, access))
    }

    /// Build services over an existing storage aggregate.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        settings: QuizSettings,
        access: AccessPolicy,
    ) -> Self {
        let sessions = Arc::new(QuizSessionService::new(
            clock,
            settings,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.results),
        ));
        let questions = Arc::new(QuestionService::new(clock, Arc::clone(&storage.questions)));
        Self {
            access: Arc::new(access),
            sessions,
            questions,
        }
    }

    #[must_use]
    pub fn role_for(&self, user: &UserId) -> Role {
        self.access.role_for(user)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }
}
