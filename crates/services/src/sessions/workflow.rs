use std::sync::Arc;

use quiz_core::model::{Category, EndReason, Question, QuizSettings, ScoreResult, UserId};
use quiz_core::{Clock, Tick};
use storage::repository::{QuestionRepository, ResultRepository, ResultRow};

use super::service::QuizSession;
use super::ticker::Ticker;
use crate::error::SessionError;

/// Outcome handed back once a session reaches its terminal state.
#[derive(Debug)]
pub struct Submission {
    pub score: ScoreResult,
    pub ended_by: EndReason,
    /// Set when the result could not be written. The score is still final.
    pub persistence_error: Option<SessionError>,
}

/// Drives quiz sessions against the question and result repositories.
///
/// The service owns the collaborators and the wall clock; sessions own their
/// own state. Every async step borrows the session mutably only after its
/// I/O has finished, so a caller can race a category fetch against clock
/// ticks with [`QuizSessionService::fetch_category`] and
/// [`QuizSessionService::apply_category`].
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    settings: QuizSettings,
    questions: Arc<dyn QuestionRepository>,
    results: Arc<dyn ResultRepository>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        questions: Arc<dyn QuestionRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            questions,
            results,
        }
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    /// A new session in the loading state.
    #[must_use]
    pub fn new_session(&self, user_id: UserId) -> QuizSession {
        QuizSession::new(user_id, self.settings)
    }

    /// Load the category list and the first category, then start the clock.
    ///
    /// On failure the session stays in `Loading` with the error recorded, and
    /// `load` may be called again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LoadFailure` if either repository call fails.
    pub async fn load(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        let loaded = self.fetch_initial().await;
        match loaded {
            Ok((categories, first)) => {
                log::info!(
                    "session {} started with {} categories",
                    session.id(),
                    categories.len()
                );
                session.activate(categories, first, self.clock.now());
                Ok(())
            }
            Err(err) => {
                log::error!("session {}: {err}", session.id());
                session.fail_load(err.to_string());
                Err(err)
            }
        }
    }

    async fn fetch_initial(
        &self,
    ) -> Result<(Vec<Category>, Option<(Category, Vec<Question>)>), SessionError> {
        let categories = self
            .questions
            .list_categories()
            .await
            .map_err(SessionError::LoadFailure)?;
        let first = match categories.first() {
            Some(category) => {
                let questions = self.fetch_category(category).await?;
                Some((category.clone(), questions))
            }
            None => None,
        };
        Ok((categories, first))
    }

    /// Fetch a category's questions without touching any session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LoadFailure` on repository failures.
    pub async fn fetch_category(&self, category: &Category) -> Result<Vec<Question>, SessionError> {
        self.questions
            .fetch_questions(category)
            .await
            .map_err(SessionError::LoadFailure)
    }

    /// Apply the outcome of [`QuizSessionService::fetch_category`].
    ///
    /// A fetch that completes after the session stopped being active is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged; the session keeps its current
    /// category and answers.
    pub fn apply_category(
        &self,
        session: &mut QuizSession,
        category: Category,
        fetched: Result<Vec<Question>, SessionError>,
    ) -> Result<(), SessionError> {
        if !session.is_active() {
            log::debug!("session {}: dropping late fetch of {category}", session.id());
            return Ok(());
        }
        match fetched {
            Ok(questions) => {
                log::debug!(
                    "session {}: loaded {} questions for {category}",
                    session.id(),
                    questions.len()
                );
                session.show_category(category, questions);
                Ok(())
            }
            Err(err) => {
                log::error!("session {}: {err}", session.id());
                Err(err)
            }
        }
    }

    /// Switch to a category, fetching it on first visit.
    ///
    /// A category that was already loaded is shown from its snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` for a category outside the
    /// session list and `SessionError::LoadFailure` if the fetch fails.
    pub async fn select_category(
        &self,
        session: &mut QuizSession,
        category: &Category,
    ) -> Result<(), SessionError> {
        if !self.needs_fetch(session, category)? {
            return Ok(());
        }
        let fetched = self.fetch_category(category).await;
        self.apply_category(session, category.clone(), fetched)
    }

    /// Prepare a category switch. Returns `true` when the caller must fetch
    /// the category before it can be shown; already loaded categories are
    /// switched to immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` for a category outside the
    /// session list.
    pub fn needs_fetch(
        &self,
        session: &mut QuizSession,
        category: &Category,
    ) -> Result<bool, SessionError> {
        if !session.is_active() {
            return Ok(false);
        }
        if !session.categories().contains(category) {
            return Err(SessionError::UnknownCategory(category.to_string()));
        }
        Ok(!session.switch_to_loaded(category))
    }

    /// Submit on the player's request.
    ///
    /// Returns `Ok(None)` when the session is not active, so a second submit
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSubmission` while loaded questions are
    /// unanswered; the session stays active.
    pub async fn submit(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<Submission>, SessionError> {
        if !session.is_active() {
            return Ok(None);
        }
        if !session.is_complete() {
            let progress = session.overall_progress();
            return Err(SessionError::InvalidSubmission {
                answered: progress.answered,
                total: progress.total,
            });
        }
        self.finalize(session, EndReason::Submitted).await
    }

    /// Advance the session clock by one second, auto-submitting on expiry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only if the result cannot be assembled.
    pub async fn tick(&self, session: &mut QuizSession) -> Result<Option<Submission>, SessionError> {
        match session.tick() {
            Tick::Expired => {
                log::info!("session {}: time is up", session.id());
                self.finalize(session, EndReason::Expired).await
            }
            Tick::Running { .. } | Tick::Idle => Ok(None),
        }
    }

    /// Feed ticks into the session until it leaves the active state, then
    /// dispose the ticker.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSessionService::tick`].
    pub async fn run_clock(
        &self,
        session: &mut QuizSession,
        ticker: &mut Ticker,
    ) -> Result<Option<Submission>, SessionError> {
        let mut outcome = None;
        while session.is_active() && ticker.tick().await.is_some() {
            outcome = self.tick(session).await?;
            if outcome.is_some() {
                break;
            }
        }
        ticker.dispose();
        Ok(outcome)
    }

    /// Latest stored result rows for a user.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LoadFailure` on repository failures.
    pub async fn history(&self, user_id: &UserId) -> Result<Vec<ResultRow>, SessionError> {
        self.results
            .list_results(user_id)
            .await
            .map_err(SessionError::LoadFailure)
    }

    async fn finalize(
        &self,
        session: &mut QuizSession,
        reason: EndReason,
    ) -> Result<Option<Submission>, SessionError> {
        let Some(result) = session.begin_submit(reason, self.clock.now())? else {
            return Ok(None);
        };

        let persistence_error = match self.results.persist_result(&result).await {
            Ok(()) => {
                log::info!(
                    "session {}: saved {} correct ({})",
                    session.id(),
                    result.score().total(),
                    reason.as_str()
                );
                None
            }
            Err(err) => {
                let err = SessionError::PersistenceFailure(err);
                log::warn!("session {}: {err}", session.id());
                Some(err)
            }
        };

        session.finish(persistence_error.as_ref().map(ToString::to_string));
        Ok(Some(Submission {
            score: result.score().clone(),
            ended_by: reason,
            persistence_error,
        }))
    }
}
