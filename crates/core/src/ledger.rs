use std::collections::HashMap;

use crate::model::Category;
use crate::question_set::QuestionSet;

/// The user's chosen options, keyed by category and question index.
///
/// Entries are added only by explicit selection and never removed. The
/// ledger does not validate indices; callers check them against the loaded
/// questions before recording.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: HashMap<Category, HashMap<usize, usize>>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the selection for a question.
    pub fn record_answer(&mut self, category: &Category, question_index: usize, option_index: usize) {
        self.entries
            .entry(category.clone())
            .or_default()
            .insert(question_index, option_index);
    }

    #[must_use]
    pub fn selection(&self, category: &Category, question_index: usize) -> Option<usize> {
        self.entries
            .get(category)
            .and_then(|answers| answers.get(&question_index))
            .copied()
    }

    #[must_use]
    pub fn answered_count(&self, category: &Category) -> usize {
        self.entries.get(category).map_or(0, HashMap::len)
    }

    /// Number of recorded answers across every category.
    #[must_use]
    pub fn total_answered(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// True when every loaded question in every category has an answer.
    ///
    /// Categories with no questions impose nothing, so an empty set is
    /// vacuously complete.
    #[must_use]
    pub fn is_complete(&self, questions: &QuestionSet) -> bool {
        questions.iter().all(|(category, list)| {
            (0..list.len()).all(|idx| self.selection(category, idx).is_some())
        })
    }
}
