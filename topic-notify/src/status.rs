//! Connection status shared with the health check.
//!
//! The monitor owns the only [`StatusReporter`]. Any number of [`StatusHandle`]s can read
//! the flags from other tasks or threads without blocking it.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[derive(Debug, Default)]
struct Flags {
    connected: AtomicBool,
    channel_joined: AtomicBool,
}

/// A point-in-time copy of the status flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Registered with the IRC server.
    pub connected: bool,
    /// Currently in the monitored channel.
    pub channel_joined: bool,
}

/// Write side of the status flags.
#[derive(Debug, Default)]
pub struct StatusReporter {
    flags: Arc<Flags>,
}

impl StatusReporter {
    /// Both flags start false.
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only handle to the same flags.
    pub fn handle(&self) -> StatusHandle {
        StatusHandle {
            flags: self.flags.clone(),
        }
    }

    /// Set the connected flag.
    pub fn set_connected(&self, connected: bool) {
        self.flags.connected.store(connected, Ordering::Release);
    }

    /// Set the channel-joined flag.
    pub fn set_channel_joined(&self, joined: bool) {
        self.flags.channel_joined.store(joined, Ordering::Release);
    }

    /// Same as reading through a handle.
    pub fn snapshot(&self) -> StatusSnapshot {
        read(&self.flags)
    }
}

/// Read side of the status flags.
#[derive(Clone, Debug)]
pub struct StatusHandle {
    flags: Arc<Flags>,
}

impl StatusHandle {
    /// Current values of both flags.
    pub fn snapshot(&self) -> StatusSnapshot {
        read(&self.flags)
    }

    /// Whether the monitor is in its channel.
    pub fn is_channel_joined(&self) -> bool {
        self.flags.channel_joined.load(Ordering::Acquire)
    }
}

fn read(flags: &Flags) -> StatusSnapshot {
    StatusSnapshot {
        connected: flags.connected.load(Ordering::Acquire),
        channel_joined: flags.channel_joined.load(Ordering::Acquire),
    }
}
