use crate::ledger::AnswerLedger;
use crate::model::{CategoryScore, ScoreResult};
use crate::question_set::QuestionSet;

/// Count matching selections per category.
///
/// A question counts as correct only when the ledger holds exactly its
/// correct option; unanswered questions count as incorrect. Pure: the same
/// inputs always yield the same result.
#[must_use]
pub fn score(questions: &QuestionSet, ledger: &AnswerLedger) -> ScoreResult {
    let per_category = questions
        .iter()
        .map(|(category, list)| {
            let correct = list
                .iter()
                .enumerate()
                .filter(|(idx, q)| ledger.selection(category, *idx) == Some(q.correct_option()))
                .count();
            CategoryScore {
                category: category.clone(),
                correct: u32::try_from(correct).unwrap_or(u32::MAX),
                total: u32::try_from(list.len()).unwrap_or(u32::MAX),
            }
        })
        .collect();
    ScoreResult::from_categories(per_category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Question};

    fn build_set(categories: &[(&str, usize)]) -> QuestionSet {
        let mut set = QuestionSet::new();
        for (name, count) in categories {
            let cat = Category::new(*name).unwrap();
            let qs = (0..*count)
                .map(|i| {
                    Question::new(
                        format!("{name} {i}"),
                        vec!["a".into(), "b".into(), "c".into(), "d".into()],
                        i % 4,
                        cat.clone(),
                    )
                    .unwrap()
                })
                .collect();
            set.insert(cat, qs);
        }
        set
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let set = build_set(&[("History", 4)]);
        let history = Category::new("History").unwrap();
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(&history, 0, 0);
        ledger.record_answer(&history, 1, 3);

        let result = score(&set, &ledger);
        assert_eq!(result.total(), 1);
        assert_eq!(result.correct_for(&history), Some(1));
        assert_eq!(result.answerable(), 4);
    }

    #[test]
    fn scoring_is_repeatable() {
        let set = build_set(&[("History", 3), ("Art", 2)]);
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(&Category::new("Art").unwrap(), 1, 1);
        assert_eq!(score(&set, &ledger), score(&set, &ledger));
    }

    #[test]
    fn empty_category_contributes_zero() {
        let set = build_set(&[("Science", 0), ("Art", 1)]);
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(&Category::new("Art").unwrap(), 0, 0);

        let result = score(&set, &ledger);
        assert_eq!(result.correct_for(&Category::new("Science").unwrap()), Some(0));
        assert_eq!(result.total(), 1);
        assert_eq!(result.answerable(), 1);
    }

    #[test]
    fn answers_for_unloaded_categories_are_ignored() {
        let set = build_set(&[("Art", 1)]);
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(&Category::new("Music").unwrap(), 0, 0);
        assert_eq!(score(&set, &ledger).total(), 0);
    }
}
