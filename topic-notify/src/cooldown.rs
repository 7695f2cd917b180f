//! Notification cooldown.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Whether a notification may be sent at `now`, given when the last one was sent.
///
/// The comparison is strict: exactly `cooldown` after the last send is still inside the
/// window. A clock that moved backwards keeps the window closed until it catches up.
pub fn may_fire(last_fired: Option<DateTime<Utc>>, now: DateTime<Utc>, cooldown: TimeDelta) -> bool {
    match last_fired {
        None => true,
        Some(last) => now - last > cooldown,
    }
}

/// Minimum spacing between two successful notifications.
///
/// Holds no timers. Callers check [`Cooldown::may_fire`] when a trigger is detected and
/// call [`Cooldown::record_fired`] only once a send has succeeded.
#[derive(Clone, Debug)]
pub struct Cooldown {
    last_fired: Option<DateTime<Utc>>,
    window: TimeDelta,
}

impl Cooldown {
    /// A cooldown that has never fired.
    pub fn new(window: Duration) -> Self {
        Self {
            last_fired: None,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
        }
    }

    /// See [`may_fire`].
    pub fn may_fire(&self, now: DateTime<Utc>) -> bool {
        may_fire(self.last_fired, now, self.window)
    }

    /// Start a new window at `now`. Returns the stored timestamp.
    pub fn record_fired(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_fired = Some(now);
        now
    }

    /// Time left until the window reopens, or `None` if a notification may fire now
    /// (or the window is too large to represent).
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        if self.may_fire(now) {
            return None;
        }
        self.last_fired
            .and_then(|last| last.checked_add_signed(self.window))
            .map(|reopens| reopens - now)
    }

    /// When the last successful notification was sent.
    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }

    /// Length of the window.
    pub fn window(&self) -> TimeDelta {
        self.window
    }
}
