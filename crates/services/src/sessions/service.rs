use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use quiz_core::model::{
    Category, EndReason, Question, QuizResult, QuizSettings, ScoreResult, SessionId, UserId,
};
use quiz_core::pagination::{Pager, page_count};
use quiz_core::{AnswerLedger, QuestionSet, SessionClock, Tick, score};

use super::progress::{CategoryProgress, SessionProgress};
use super::view::VisibleQuestion;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz session.
///
/// `Loading → Active → Submitting → Terminal`. `Terminal` is absorbing.
/// `Disposed` marks a session torn down before it finished; it is absorbing
/// too and never writes a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Active,
    Submitting,
    Terminal,
    Disposed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz attempt.
///
/// Holds the category list, the question snapshots loaded so far, the answer
/// ledger, per-category pagination, and the countdown. Every mutating entry
/// point is a no-op unless the session is `Active`. Async work (loading,
/// persisting) lives in `QuizSessionService`; this type only moves between
/// states.
pub struct QuizSession {
    id: SessionId,
    user_id: UserId,
    settings: QuizSettings,
    state: SessionState,
    load_error: Option<String>,
    categories: Vec<Category>,
    current: Option<Category>,
    questions: QuestionSet,
    pagers: HashMap<Category, Pager>,
    ledger: AnswerLedger,
    clock: SessionClock,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    ended_by: Option<EndReason>,
    result: Option<ScoreResult>,
    persistence_error: Option<String>,
}

impl QuizSession {
    /// A fresh session waiting for its first load.
    #[must_use]
    pub fn new(user_id: UserId, settings: QuizSettings) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            settings,
            state: SessionState::Loading,
            load_error: None,
            categories: Vec::new(),
            current: None,
            questions: QuestionSet::new(),
            pagers: HashMap::new(),
            ledger: AnswerLedger::new(),
            clock: SessionClock::new(settings.duration_secs()),
            started_at: None,
            completed_at: None,
            ended_by: None,
            result: None,
            persistence_error: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state == SessionState::Terminal
    }

    /// Message of the last failed load while still `Loading`.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// All categories offered in this session, in first-seen order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn current_category(&self) -> Option<&Category> {
        self.current.as_ref()
    }

    /// The authoritative questions loaded so far.
    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn is_loaded(&self, category: &Category) -> bool {
        self.questions.contains(category)
    }

    #[must_use]
    pub fn remaining_time(&self) -> u32 {
        self.clock.remaining()
    }

    #[must_use]
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn ended_by(&self) -> Option<EndReason> {
        self.ended_by
    }

    /// The score, available only once the session is terminal.
    #[must_use]
    pub fn result(&self) -> Option<&ScoreResult> {
        if self.is_terminal() {
            self.result.as_ref()
        } else {
            None
        }
    }

    /// Why the single result write failed, if it did.
    #[must_use]
    pub fn persistence_error(&self) -> Option<&str> {
        self.persistence_error.as_deref()
    }

    // ─── Reads ─────────────────────────────────────────────────────────────

    /// Answered and total counts for one category.
    #[must_use]
    pub fn progress(&self, category: &Category) -> CategoryProgress {
        CategoryProgress {
            answered: self.ledger.answered_count(category),
            total: self.questions.get(category).map_or(0, <[Question]>::len),
        }
    }

    /// Progress across every loaded category.
    #[must_use]
    pub fn overall_progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self
            .questions
            .categories()
            .map(|c| self.ledger.answered_count(c))
            .sum::<usize>();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// True when every loaded question has an answer.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.ledger.is_complete(&self.questions)
    }

    /// Questions on the current page of the current category.
    #[must_use]
    pub fn visible_questions(&self) -> Vec<VisibleQuestion<'_>> {
        let Some(category) = self.current.as_ref() else {
            return Vec::new();
        };
        let Some(list) = self.questions.get(category) else {
            return Vec::new();
        };
        let pager = self.pager_for(category);
        let offset = pager.offset();
        pager
            .window(list)
            .iter()
            .enumerate()
            .map(|(i, q)| VisibleQuestion {
                index: offset + i,
                text: q.text(),
                options: q.options(),
                selected: self.ledger.selection(category, offset + i),
            })
            .collect()
    }

    /// Zero-based current page and page count for the current category.
    #[must_use]
    pub fn page_position(&self) -> (usize, usize) {
        let Some(category) = self.current.as_ref() else {
            return (0, 1);
        };
        let len = self.questions.get(category).map_or(0, <[Question]>::len);
        (
            self.pager_for(category).current(),
            page_count(len, self.settings.page_size()),
        )
    }

    fn pager_for(&self, category: &Category) -> Pager {
        self.pagers
            .get(category)
            .copied()
            .unwrap_or_else(|| Pager::new(self.settings.page_size()))
    }

    // ─── User actions ──────────────────────────────────────────────────────

    /// Record or overwrite the selected option for a loaded question.
    ///
    /// Does nothing unless the session is active.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` if the category has not been
    /// loaded, `QuestionOutOfRange` or `OptionOutOfRange` for bad indices.
    pub fn record_answer(
        &mut self,
        category: &Category,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        if !self.is_active() {
            log::debug!("session {}: ignoring answer while {:?}", self.id, self.state);
            return Ok(());
        }
        let list = self
            .questions
            .get(category)
            .ok_or_else(|| SessionError::UnknownCategory(category.to_string()))?;
        let question = list
            .get(question_index)
            .ok_or_else(|| SessionError::QuestionOutOfRange {
                category: category.to_string(),
                index: question_index,
            })?;
        if option_index >= question.options().len() {
            return Err(SessionError::OptionOutOfRange {
                option: option_index,
            });
        }
        self.ledger
            .record_answer(category, question_index, option_index);
        Ok(())
    }

    /// Answer a question of the category currently on screen.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::record_answer`].
    pub fn answer_current(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        let Some(category) = self.current.clone() else {
            return Ok(());
        };
        self.record_answer(&category, question_index, option_index)
    }

    pub fn next_page(&mut self) {
        if !self.is_active() {
            return;
        }
        let Some(category) = self.current.clone() else {
            return;
        };
        let len = self.questions.get(&category).map_or(0, <[Question]>::len);
        let mut pager = self.pager_for(&category);
        pager.next_page(len);
        self.pagers.insert(category, pager);
    }

    pub fn prev_page(&mut self) {
        if !self.is_active() {
            return;
        }
        let Some(category) = self.current.clone() else {
            return;
        };
        let mut pager = self.pager_for(&category);
        pager.prev_page();
        self.pagers.insert(category, pager);
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `Tick::Idle` unless the session is active.
    pub fn tick(&mut self) -> Tick {
        if !self.is_active() {
            return Tick::Idle;
        }
        self.clock.tick()
    }

    /// Tear the session down without finishing it. Stops the clock; no
    /// result is computed or written. Ignored once terminal.
    pub fn dispose(&mut self) {
        if matches!(self.state, SessionState::Terminal | SessionState::Disposed) {
            return;
        }
        self.clock.dispose();
        self.state = SessionState::Disposed;
        log::info!("session {} disposed", self.id);
    }

    // ─── Transitions driven by the service ─────────────────────────────────

    pub(crate) fn fail_load(&mut self, message: String) {
        if self.state == SessionState::Loading {
            self.load_error = Some(message);
        }
    }

    /// `Loading → Active`: take the category list and the first category's
    /// questions, start the clock.
    pub(crate) fn activate(
        &mut self,
        categories: Vec<Category>,
        first: Option<(Category, Vec<Question>)>,
        now: DateTime<Utc>,
    ) {
        if self.state != SessionState::Loading {
            return;
        }
        self.categories = categories;
        self.load_error = None;
        self.state = SessionState::Active;
        self.started_at = Some(now);
        self.clock.start(self.settings.duration_secs());
        if let Some((category, questions)) = first {
            self.show_category(category, questions);
        }
    }

    /// Switch to an already loaded category. Returns false if it is not loaded.
    pub(crate) fn switch_to_loaded(&mut self, category: &Category) -> bool {
        if !self.is_loaded(category) {
            return false;
        }
        self.current = Some(category.clone());
        true
    }

    /// Keep a freshly fetched snapshot and show it. An existing snapshot is
    /// never replaced so recorded indices keep pointing at the same questions.
    pub(crate) fn show_category(&mut self, category: Category, questions: Vec<Question>) {
        if !self.is_active() {
            return;
        }
        if !self.questions.contains(&category) {
            self.questions.insert(category.clone(), questions);
        }
        if !self.categories.contains(&category) {
            self.categories.push(category.clone());
        }
        self.current = Some(category);
    }

    /// `Active → Submitting`: freeze the clock, score, and hand back the
    /// result to persist. `None` if the session was not active.
    pub(crate) fn begin_submit(
        &mut self,
        reason: EndReason,
        now: DateTime<Utc>,
    ) -> Result<Option<QuizResult>, SessionError> {
        if !self.is_active() {
            return Ok(None);
        }
        self.clock.dispose();
        self.state = SessionState::Submitting;

        let score = score(&self.questions, &self.ledger);
        let started_at = self.started_at.unwrap_or(now);
        let completed_at = now.max(started_at);
        self.completed_at = Some(completed_at);
        self.ended_by = Some(reason);
        self.result = Some(score.clone());

        let result = QuizResult::new(
            self.id,
            self.user_id.clone(),
            score,
            reason,
            started_at,
            completed_at,
        )?;
        Ok(Some(result))
    }

    /// `Submitting → Terminal`, whatever the outcome of the write.
    pub(crate) fn finish(&mut self, persistence_error: Option<String>) {
        if self.state != SessionState::Submitting {
            return;
        }
        self.persistence_error = persistence_error;
        self.state = SessionState::Terminal;
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("state", &self.state)
            .field("categories", &self.categories.len())
            .field("loaded_questions", &self.questions.len())
            .field("answered", &self.ledger.total_answered())
            .field("remaining_secs", &self.clock.remaining())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
