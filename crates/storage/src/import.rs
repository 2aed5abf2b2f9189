//! Bulk-import format for the question bank.
//!
//! A file is a JSON array of objects shaped like
//! `{"question": "...", "options": ["..", "..", "..", ".."], "answer": 2, "category": "..."}`.
//! The top level must be an array; each element is decoded on its own so a
//! bad entry does not sink the rest of the batch.

use quiz_core::model::{Question, QuestionDraft};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid file format: expected an array of questions")]
    NotAnArray,
}

/// Why a single entry of an import file was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportItemError {
    #[error("entry {index}: malformed entry: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("entry {index}: {reason}")]
    Invalid { index: usize, reason: String },
}

/// Decode an import file into per-entry outcomes, in file order.
///
/// # Errors
///
/// Returns `ImportError` if the text is not JSON or not a JSON array.
pub fn parse_questions(text: &str) -> Result<Vec<Result<Question, ImportItemError>>, ImportError> {
    let Value::Array(items) = serde_json::from_str::<Value>(text)? else {
        return Err(ImportError::NotAnArray);
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let draft: QuestionDraft =
                serde_json::from_value(item).map_err(|e| ImportItemError::Malformed {
                    index,
                    reason: e.to_string(),
                })?;
            draft.validate().map_err(|e| ImportItemError::Invalid {
                index,
                reason: e.to_string(),
            })
        })
        .collect())
}

/// Encode questions in the same shape the importer reads.
///
/// # Errors
///
/// Returns `ImportError::Json` if serialization fails.
pub fn to_json<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Result<String, ImportError> {
    let drafts: Vec<QuestionDraft> = questions
        .into_iter()
        .map(|q| QuestionDraft {
            question: q.text().to_owned(),
            options: q.options().to_vec(),
            answer: i64::try_from(q.correct_option()).unwrap_or(i64::MAX),
            category: q.category().to_string(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&drafts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_and_reports_bad_entries() {
        let text = r#"[
            {"question": "What is the capital of France?",
             "options": ["Berlin", "London", "Paris", "Madrid"],
             "answer": 2, "category": "geography"},
            {"question": "Missing options", "answer": 0, "category": "x"},
            {"question": "Out of range",
             "options": ["a", "b", "c", "d"], "answer": 7, "category": "x"}
        ]"#;

        let items = parse_questions(text).unwrap();
        assert_eq!(items.len(), 3);

        let first = items[0].as_ref().unwrap();
        assert_eq!(first.correct_option(), 2);
        assert_eq!(first.category().as_str(), "geography");

        assert!(matches!(
            items[1],
            Err(ImportItemError::Malformed { index: 1, .. })
        ));
        assert!(matches!(
            items[2],
            Err(ImportItemError::Invalid { index: 2, .. })
        ));
    }

    #[test]
    fn rejects_non_array_top_level() {
        let err = parse_questions(r#"{"question": "q"}"#).unwrap_err();
        assert!(matches!(err, ImportError::NotAnArray));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_questions("[{").unwrap_err(),
            ImportError::Json(_)
        ));
    }

    #[test]
    fn exported_questions_import_back() {
        let text = r#"[{"question": "Q", "options": ["a","b","c","d"], "answer": 3, "category": "Art"}]"#;
        let parsed: Vec<Question> = parse_questions(text)
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        let exported = to_json(&parsed).unwrap();
        let again: Vec<Question> = parse_questions(&exported)
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(parsed, again);
    }
}
