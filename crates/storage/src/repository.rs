use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    Category, CategoryScore, EndReason, Question, QuestionId, QuizResult, SessionId, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A question as stored, with its assigned id and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub question: Question,
    pub created_at: DateTime<Utc>,
}

/// One persisted per-category line of a user's latest result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub score: CategoryScore,
    pub ended_by: EndReason,
    pub completed_at: DateTime<Utc>,
}

impl ResultRow {
    /// Split a finished attempt into one row per category.
    #[must_use]
    pub fn rows_for(result: &QuizResult) -> Vec<Self> {
        result
            .score()
            .per_category()
            .iter()
            .map(|score| Self {
                user_id: result.user_id().clone(),
                session_id: result.session_id(),
                score: score.clone(),
                ended_by: result.ended_by(),
                completed_at: result.completed_at(),
            })
            .collect()
    }
}

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Store a new question and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(
        &self,
        question: &Question,
        created_at: DateTime<Utc>,
    ) -> Result<QuestionId, StorageError>;

    /// Remove a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no question has this id.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// Every stored question in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError>;

    /// Distinct categories in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;

    /// Questions of one category in insertion order. Unknown categories
    /// yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn fetch_questions(&self, category: &Category) -> Result<Vec<Question>, StorageError>;
}

/// Repository contract for quiz results, keyed by user and category.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Write every category of `result` in one call, overwriting any earlier
    /// row for the same user and category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; nothing is written then.
    async fn persist_result(&self, result: &QuizResult) -> Result<(), StorageError>;

    /// Stored rows for a user, ordered by category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results(&self, user_id: &UserId) -> Result<Vec<ResultRow>, StorageError>;
}

#[derive(Default)]
struct QuestionTable {
    next_id: u64,
    rows: Vec<QuestionRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<QuestionTable>>,
    results: Arc<Mutex<HashMap<(UserId, Category), ResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(
        &self,
        question: &Question,
        created_at: DateTime<Utc>,
    ) -> Result<QuestionId, StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.next_id += 1;
        let id = QuestionId::new(guard.next_id);
        guard.rows.push(QuestionRecord {
            id,
            question: question.clone(),
            created_at,
        });
        Ok(id)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let pos = guard
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or(StorageError::NotFound)?;
        guard.rows.remove(pos);
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.rows.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<Category> = Vec::new();
        for record in &guard.rows {
            let category = record.question.category();
            if !out.contains(category) {
                out.push(category.clone());
            }
        }
        Ok(out)
    }

    async fn fetch_questions(&self, category: &Category) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .rows
            .iter()
            .filter(|r| r.question.category() == category)
            .map(|r| r.question.clone())
            .collect())
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn persist_result(&self, result: &QuizResult) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for row in ResultRow::rows_for(result) {
            guard.insert((row.user_id.clone(), row.score.category.clone()), row);
        }
        Ok(())
    }

    async fn list_results(&self, user_id: &UserId) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<ResultRow> = guard
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by(|a, b| a.score.category.cmp(&b.score.category));
        Ok(rows)
    }
}

/// Aggregates question and result repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { questions, results }
    }
}
