//! Who may manage the question bank.

use std::collections::HashSet;

use quiz_core::model::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May add, import, and delete questions.
    Admin,
    /// May take quizzes and read their own results.
    Player,
}

impl Role {
    #[must_use]
    pub fn can_manage_questions(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Maps a user to a role using a configured set of admin addresses.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: HashSet<UserId>,
}

impl AccessPolicy {
    /// Build from raw addresses; blanks are skipped and matching ignores case.
    #[must_use]
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admins: emails.into_iter().filter_map(UserId::new).collect(),
        }
    }

    /// Parse a comma separated list such as `QUIZ_ADMIN_EMAILS`.
    #[must_use]
    pub fn from_list(raw: &str) -> Self {
        Self::from_emails(raw.split(','))
    }

    #[must_use]
    pub fn role_for(&self, user: &UserId) -> Role {
        if self.admins.contains(user) {
            Role::Admin
        } else {
            Role::Player
        }
    }

    #[must_use]
    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }
}
