use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every question offers exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("category cannot be empty")]
    EmptyCategory,

    #[error("expected {OPTION_COUNT} options, got {0}")]
    WrongOptionCount(usize),

    #[error("option {0} cannot be empty")]
    EmptyOption(usize),

    #[error("correct option must be between 0 and 3, got {0}")]
    CorrectOptionOutOfRange(i64),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Grouping label partitioning the question set.
///
/// Compared exactly (case-sensitive) after trimming surrounding whitespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyCategory` for blank input.
    pub fn new(raw: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Category {
    type Error = QuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category({})", self.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with its authoritative answer.
///
/// Immutable once built; sessions hold read-only snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: [String; OPTION_COUNT],
    correct_option: usize,
    category: Category,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text or any option is blank, the option
    /// count is not four, or `correct_option` is outside `0..=3`.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        category: Category,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let count = options.len();
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|_| QuestionError::WrongOptionCount(count))?;
        if let Some(idx) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption(idx));
        }

        if correct_option >= OPTION_COUNT {
            return Err(QuestionError::CorrectOptionOutOfRange(
                i64::try_from(correct_option).unwrap_or(i64::MAX),
            ));
        }

        Ok(Self {
            text: text.trim().to_owned(),
            options,
            correct_option,
            category,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Index of the correct option. Only the scoring path should read this.
    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as typed into the question manager or read from a
/// bulk-import file: `{question, options[4], answer, category}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer: i64,
    pub category: String,
}

impl QuestionDraft {
    /// # Errors
    ///
    /// Returns `QuestionError` when any field fails validation.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let correct = usize::try_from(self.answer)
            .map_err(|_| QuestionError::CorrectOptionOutOfRange(self.answer))?;
        if correct >= OPTION_COUNT {
            return Err(QuestionError::CorrectOptionOutOfRange(self.answer));
        }
        let category = Category::new(self.category)?;
        Question::new(self.question, self.options, correct, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        ["Berlin", "London", "Paris", "Madrid"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new(
            "What is the capital of France?",
            options(),
            2,
            Category::new("geography").unwrap(),
        )
        .unwrap();
        assert!(q.is_correct(2));
        assert!(!q.is_correct(0));
        assert_eq!(q.options()[2], "Paris");
    }

    #[test]
    fn rejects_wrong_option_count() {
        let err = Question::new(
            "Q",
            vec!["a".into(), "b".into()],
            0,
            Category::new("c").unwrap(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::WrongOptionCount(2));
    }

    #[test]
    fn rejects_blank_option() {
        let mut opts = options();
        opts[1] = "  ".into();
        let err = Question::new("Q", opts, 0, Category::new("c").unwrap()).unwrap_err();
        assert_eq!(err, QuestionError::EmptyOption(1));
    }

    #[test]
    fn draft_rejects_out_of_range_answer() {
        let draft = QuestionDraft {
            question: "Q".into(),
            options: options(),
            answer: 4,
            category: "c".into(),
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            QuestionError::CorrectOptionOutOfRange(4)
        );

        let negative = QuestionDraft {
            question: "Q".into(),
            options: options(),
            answer: -1,
            category: "c".into(),
        };
        assert_eq!(
            negative.validate().unwrap_err(),
            QuestionError::CorrectOptionOutOfRange(-1)
        );
    }

    #[test]
    fn draft_rejects_blank_category() {
        let draft = QuestionDraft {
            question: "Q".into(),
            options: options(),
            answer: 1,
            category: " ".into(),
        };
        assert_eq!(draft.validate().unwrap_err(), QuestionError::EmptyCategory);
    }

    #[test]
    fn category_is_trimmed_and_case_sensitive() {
        let a = Category::new(" History ").unwrap();
        assert_eq!(a.as_str(), "History");
        assert_ne!(a, Category::new("history").unwrap());
    }
}
