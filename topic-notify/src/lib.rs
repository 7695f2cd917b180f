//! Watch an IRC channel topic and send a Pushover alert when it contains a trigger phrase.
//!
//! The pieces, leaf first: [`trigger`] decides whether a topic matches, [`cooldown`]
//! decides whether a match may notify now, [`notify`] delivers the alert,
//! [`TopicMonitor`] reacts to protocol events, and [`Supervisor`] keeps a session
//! running until shutdown. [`StatusHandle`] lets a health check read the connection state.

pub mod config;
pub mod cooldown;
pub mod monitor;
pub mod notify;
pub mod session;
pub mod status;
pub mod supervisor;
pub mod trigger;

pub(crate) mod human_duration;

pub use config::{ConfigErrors, IrcConfig, MonitorConfig, NotificationConfig, PushoverConfig};
pub use cooldown::Cooldown;
pub use monitor::{MonitorEvent, MonitorState, SessionEnd, TopicMonitor};
pub use notify::{NotificationPayload, NotificationSink, NotifyError};
pub use session::{ChatSession, Connector, IrcConnector, IrcSession, SessionError};
pub use status::{StatusHandle, StatusReporter, StatusSnapshot};
pub use supervisor::Supervisor;
pub use trigger::TriggerConfig;
