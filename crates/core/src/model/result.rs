use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Category, SessionId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("category {category} has {correct} correct out of {total}")]
    CorrectExceedsTotal {
        category: String,
        correct: u32,
        total: u32,
    },

    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("unknown end reason: {0}")]
    UnknownEndReason(String),
}

/// Correct answers for one category, out of the questions loaded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScore {
    pub category: Category,
    pub correct: u32,
    pub total: u32,
}

/// Per-category and aggregate correct counts.
///
/// Always derived from a ledger and the authoritative questions, never
/// accumulated. Category order follows the order the session loaded them in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreResult {
    per_category: Vec<CategoryScore>,
    total: u32,
}

impl ScoreResult {
    #[must_use]
    pub fn from_categories(per_category: Vec<CategoryScore>) -> Self {
        let total = per_category
            .iter()
            .fold(0_u32, |acc, c| acc.saturating_add(c.correct));
        Self {
            per_category,
            total,
        }
    }

    /// Rehydrate a score from persisted per-category rows.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::CorrectExceedsTotal` if a row is inconsistent.
    pub fn from_persisted(per_category: Vec<CategoryScore>) -> Result<Self, ScoreError> {
        if let Some(bad) = per_category.iter().find(|c| c.correct > c.total) {
            return Err(ScoreError::CorrectExceedsTotal {
                category: bad.category.to_string(),
                correct: bad.correct,
                total: bad.total,
            });
        }
        Ok(Self::from_categories(per_category))
    }

    #[must_use]
    pub fn per_category(&self) -> &[CategoryScore] {
        &self.per_category
    }

    /// Sum of correct answers across all categories.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of questions that counted towards the score.
    #[must_use]
    pub fn answerable(&self) -> u32 {
        self.per_category
            .iter()
            .fold(0_u32, |acc, c| acc.saturating_add(c.total))
    }

    #[must_use]
    pub fn correct_for(&self, category: &Category) -> Option<u32> {
        self.per_category
            .iter()
            .find(|c| &c.category == category)
            .map(|c| c.correct)
    }

    /// Whole-number percentage of correct answers; 0 when nothing was answerable.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u32 {
        let answerable = self.answerable();
        if answerable == 0 {
            return 0;
        }
        // total <= answerable, so this stays within 0..=100
        (f64::from(self.total) / f64::from(answerable) * 100.0).round() as u32
    }
}

/// How a session reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Submitted,
    Expired,
}

impl EndReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Submitted => "submitted",
            EndReason::Expired => "expired",
        }
    }

    /// # Errors
    ///
    /// Returns `ScoreError::UnknownEndReason` for unrecognized values.
    pub fn parse(raw: &str) -> Result<Self, ScoreError> {
        match raw {
            "submitted" => Ok(EndReason::Submitted),
            "expired" => Ok(EndReason::Expired),
            other => Err(ScoreError::UnknownEndReason(other.to_owned())),
        }
    }
}

/// A finished attempt, ready to hand to the results store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    session_id: SessionId,
    user_id: UserId,
    score: ScoreResult,
    ended_by: EndReason,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// # Errors
    ///
    /// Returns `ScoreError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn new(
        session_id: SessionId,
        user_id: UserId,
        score: ScoreResult,
        ended_by: EndReason,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        if completed_at < started_at {
            return Err(ScoreError::InvalidTimeRange);
        }
        Ok(Self {
            session_id,
            user_id,
            score,
            ended_by,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn score(&self) -> &ScoreResult {
        &self.score
    }

    #[must_use]
    pub fn ended_by(&self) -> EndReason {
        self.ended_by
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
