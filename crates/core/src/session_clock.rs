/// Countdown governing a whole quiz session.
///
/// One clock runs for the entire multi-category session; switching categories
/// or pages never touches it. The owner drives it with [`SessionClock::tick`]
/// once per second. Reaching zero yields [`Tick::Expired`] exactly once, and
/// after [`SessionClock::dispose`] the remaining time is frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    remaining: u32,
    running: bool,
    expiry_reported: bool,
    disposed: bool,
}

/// Outcome of a single clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Clock is not running (never started, disposed, or already expired).
    Idle,
    /// One second elapsed; time remains.
    Running { remaining: u32 },
    /// The countdown just hit zero. Reported once per clock.
    Expired,
}

impl SessionClock {
    /// A stopped clock holding `duration_secs`.
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs,
            running: false,
            expiry_reported: false,
            disposed: false,
        }
    }

    /// Begin counting down from `duration_secs`. Ignored once disposed.
    pub fn start(&mut self, duration_secs: u32) {
        if self.disposed {
            return;
        }
        self.remaining = duration_secs;
        self.running = true;
        self.expiry_reported = false;
    }

    /// Decrement by one second, floored at zero.
    pub fn tick(&mut self) -> Tick {
        if !self.running || self.disposed {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return Tick::Running {
                remaining: self.remaining,
            };
        }
        self.running = false;
        if self.expiry_reported {
            Tick::Idle
        } else {
            self.expiry_reported = true;
            Tick::Expired
        }
    }

    /// Stop the clock for good. Idempotent.
    pub fn dispose(&mut self) {
        self.running = false;
        self.disposed = true;
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Render seconds as `M:SS`, minutes unbounded.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
