//! Display wrapper for chrono::TimeDelta with coarse precision

use chrono::TimeDelta;
use std::{
    fmt::{self, Display},
    time::Duration,
};

/// Formats a TimeDelta like "24m59s". Negative deltas display as zero.
/// Precision drops to minutes above one hour.
#[derive(Clone, Copy, Debug)]
pub struct HumanDuration(pub TimeDelta);

impl Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut secs = self.0.to_std().unwrap_or_default().as_secs();

        if secs > 3600 {
            secs -= secs % 60;
        }

        let formatted = humantime::format_duration(Duration::from_secs(secs))
            .to_string()
            .replace(' ', "");
        write!(f, "{formatted}")
    }
}
