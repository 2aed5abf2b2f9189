use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Category, QuestionDraft, QuestionId};
use storage::import::{ImportItemError, parse_questions, to_json};
use storage::repository::{QuestionRecord, QuestionRepository};

use crate::Clock;
use crate::error::QuestionServiceError;

/// Outcome of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub total: usize,
    /// Entries that were skipped, with the reason.
    pub failures: Vec<String>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inserted {} out of {} questions", self.inserted, self.total)
    }
}

/// Manages the question bank.
#[derive(Clone)]
pub struct QuestionService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { clock, questions }
    }

    /// Validate and store a single question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Invalid` for validation failures.
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
    ) -> Result<QuestionId, QuestionServiceError> {
        let question = draft.validate()?;
        let id = self
            .questions
            .insert_question(&question, self.clock.now())
            .await?;
        log::info!("added question {id} to {}", question.category());
        Ok(id)
    }

    /// Every stored question, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` on repository failures.
    pub async fn list_questions(&self) -> Result<Vec<QuestionRecord>, QuestionServiceError> {
        Ok(self.questions.list_questions().await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` on repository failures.
    pub async fn list_categories(&self) -> Result<Vec<Category>, QuestionServiceError> {
        Ok(self.questions.list_categories().await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage`, wrapping `NotFound` for
    /// unknown ids.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), QuestionServiceError> {
        self.questions.delete_question(id).await?;
        log::info!("deleted question {id}");
        Ok(())
    }

    /// Import a JSON array of questions.
    ///
    /// Each entry is validated and stored on its own; bad entries and failed
    /// writes are counted in the report and do not stop the batch.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Import` if the text is not a JSON array.
    pub async fn import_json(&self, text: &str) -> Result<ImportReport, QuestionServiceError> {
        let entries = parse_questions(text)?;
        let total = entries.len();
        let now = self.clock.now();
        let mut inserted = 0;
        let mut failures = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let outcome = match entry {
                Ok(question) => self
                    .questions
                    .insert_question(&question, now)
                    .await
                    .map(|_| ())
                    .map_err(|e| format!("entry {index}: {e}")),
                Err(ImportItemError::Malformed { index, reason }
                | ImportItemError::Invalid { index, reason }) => {
                    Err(format!("entry {index}: {reason}"))
                }
            };
            match outcome {
                Ok(()) => inserted += 1,
                Err(reason) => {
                    log::warn!("import skipped {reason}");
                    failures.push(reason);
                }
            }
        }

        let report = ImportReport {
            inserted,
            total,
            failures,
        };
        log::info!("{report}");
        Ok(report)
    }

    /// Serialize the whole bank in the import format.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError` on repository or encoding failures.
    pub async fn export_json(&self) -> Result<String, QuestionServiceError> {
        let records = self.questions.list_questions().await?;
        Ok(to_json(records.iter().map(|r| &r.question))?)
    }
}
