//! Millisecond deadlines on a wrapping platform clock.
//!
//! The engine never sleeps. It samples `RadioDriver::millis()` once per tick
//! and compares against a `Deadline`, so the clock is allowed to wrap.

/// Default length of one poll + listen discovery cycle in milliseconds.
pub const DEFAULT_TOTAL_DURATION_MS: u32 = 1000;

/// Point in time on the platform clock after which a timer counts as expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: u32,
}

impl Deadline {
    /// Deadline `ms` milliseconds after `now`.
    pub fn after(now: u32, ms: u32) -> Self {
        Self {
            expires_at: now.wrapping_add(ms),
        }
    }

    /// `now` is at or past the deadline
    pub fn is_expired(&self, now: u32) -> bool {
        (now.wrapping_sub(self.expires_at) as i32) >= 0
    }

    /// Milliseconds left, 0 once expired.
    pub fn remaining(&self, now: u32) -> u32 {
        if self.is_expired(now) {
            0
        } else {
            self.expires_at.wrapping_sub(now)
        }
    }
}
