use crate::model::{Category, Question};

/// The authoritative questions a session has loaded, grouped by category.
///
/// Categories keep the order they were inserted in. The position of a
/// question inside its category is its canonical index for display, answer
/// recording, and scoring alike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    groups: Vec<(Category, Vec<Question>)>,
}

impl QuestionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a flat list by category, keeping first-seen category order and
    /// the relative order of questions within a category.
    #[must_use]
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut set = Self::new();
        for question in questions {
            let category = question.category().clone();
            match set.groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, list)) => list.push(question),
                None => set.groups.push((category, vec![question])),
            }
        }
        set
    }

    /// Store the snapshot for a category, replacing any previous one.
    pub fn insert(&mut self, category: Category, questions: Vec<Question>) {
        match self.groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, list)) => *list = questions,
            None => self.groups.push((category, questions)),
        }
    }

    #[must_use]
    pub fn get(&self, category: &Category) -> Option<&[Question]> {
        self.groups
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, list)| list.as_slice())
    }

    #[must_use]
    pub fn contains(&self, category: &Category) -> bool {
        self.get(category).is_some()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.groups.iter().map(|(c, _)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[Question])> {
        self.groups.iter().map(|(c, list)| (c, list.as_slice()))
    }

    /// Total number of loaded questions across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, list)| list.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
