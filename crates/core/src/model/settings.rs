use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("quiz duration must be > 0 seconds")]
    InvalidDuration,

    #[error("page size must be > 0")]
    InvalidPageSize,
}

/// Tunables for a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    duration_secs: u32,
    page_size: usize,
}

impl QuizSettings {
    /// Sixty minutes for the whole session.
    pub const DEFAULT_DURATION_SECS: u32 = 60 * 60;
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    /// # Errors
    ///
    /// Returns `SettingsError` if either value is zero.
    pub fn new(duration_secs: u32, page_size: usize) -> Result<Self, SettingsError> {
        if duration_secs == 0 {
            return Err(SettingsError::InvalidDuration);
        }
        if page_size == 0 {
            return Err(SettingsError::InvalidPageSize);
        }
        Ok(Self {
            duration_secs,
            page_size,
        })
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            duration_secs: Self::DEFAULT_DURATION_SECS,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}
