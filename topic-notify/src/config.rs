//! Monitor configuration.

use crate::trigger::TriggerConfig;
use conf::Conf;
use std::time::Duration;

/// Default IRC TLS port.
pub const DEFAULT_IRC_PORT: u16 = 6697;
/// Default alert body.
pub const DEFAULT_MESSAGE: &str = "🔔 Topic trigger detected!\n\nCheck the channel for details.";

/// IRC server, channel and identity.
#[derive(Clone, Conf, Debug)]
#[conf(serde)]
pub struct IrcConfig {
    /// IRC server hostname, e.g. irc.libera.chat
    #[conf(long, env)]
    pub server: String,
    /// IRC server TLS port
    #[conf(long, env, default_value = "6697")]
    pub port: u16,
    /// Channel to monitor, including the leading '#'
    #[conf(long, env)]
    pub channel: String,
    /// Nickname to register with. '_' is appended while it is taken.
    #[conf(long, env, default_value = "TopicWatcher")]
    pub nickname: String,
    /// Real name sent at registration
    #[conf(long, env, default_value = "Topic Monitor Bot")]
    pub realname: String,
    /// How long to wait before reconnecting after the connection is lost
    #[conf(long, env, default_value = "60s", value_parser = humantime::parse_duration, serde(use_value_parser))]
    pub reconnect_delay: Duration,
    /// How long to wait before rejoining after being kicked
    #[conf(long, env, default_value = "30s", value_parser = humantime::parse_duration, serde(use_value_parser))]
    pub rejoin_delay: Duration,
    /// Give up on a connection attempt (TCP, TLS and registration) after this long
    #[conf(long, env, default_value = "30s", value_parser = humantime::parse_duration, serde(use_value_parser))]
    pub connect_timeout: Duration,
}

impl IrcConfig {
    /// Registration parameters for the IRC transport.
    pub fn connection(&self) -> irc_tls_client::ConnectionConfig {
        irc_tls_client::ConnectionConfig {
            server: self.server.clone(),
            port: self.port,
            nickname: self.nickname.clone(),
            realname: self.realname.clone(),
            connect_timeout: self.connect_timeout,
        }
    }
}

/// What the alert looks like and how often it may be sent.
#[derive(Clone, Conf, Debug)]
#[conf(serde)]
pub struct NotificationConfig {
    /// Alert title
    #[conf(long, env, default_value = "IRC Topic Alert")]
    pub title: String,
    /// Alert body
    #[conf(long, env, default_value = "🔔 Topic trigger detected!\n\nCheck the channel for details.")]
    pub message: String,
    /// Optional link attached to the alert
    #[conf(long, env)]
    pub url: Option<String>,
    /// Label for the link
    #[conf(long, env, default_value = "Open Link")]
    pub url_title: String,
    /// Minimum time between two alerts
    #[conf(long, env, default_value = "30m", value_parser = humantime::parse_duration, serde(use_value_parser))]
    pub cooldown: Duration,
    /// Give up on a notification request after this long
    #[conf(long, env, default_value = "30s", value_parser = humantime::parse_duration, serde(use_value_parser))]
    pub timeout: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "IRC Topic Alert".into(),
            message: DEFAULT_MESSAGE.into(),
            url: None,
            url_title: "Open Link".into(),
            cooldown: Duration::from_secs(30 * 60),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Pushover credentials.
#[derive(Clone, Conf)]
#[conf(serde)]
pub struct PushoverConfig {
    /// Pushover application API token
    #[conf(long, env)]
    pub app_token: String,
    /// Pushover user key
    #[conf(long, env)]
    pub user_key: String,
    /// Pushover messages endpoint
    #[conf(long, env, default_value = "https://api.pushover.net/1/messages.json")]
    pub api_url: String,
}

impl PushoverConfig {
    /// Build a client for these credentials.
    pub fn client(&self) -> Result<pushover_http_client::Client, pushover_http_client::Error> {
        pushover_http_client::Client::new(&self.api_url, &self.app_token, &self.user_key)
    }
}

impl std::fmt::Debug for PushoverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverConfig")
            .field("app_token", &"<redacted>")
            .field("user_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Everything the monitor needs.
#[derive(Clone, Conf, Debug)]
#[conf(serde, test)]
pub struct MonitorConfig {
    #[conf(flatten, prefix)]
    pub irc: IrcConfig,
    #[conf(flatten, prefix)]
    pub trigger: TriggerConfig,
    #[conf(flatten, prefix)]
    pub notification: NotificationConfig,
    #[conf(flatten, prefix)]
    pub pushover: PushoverConfig,
}

/// All problems found by [`MonitorConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {}", .0.join("; "))]
pub struct ConfigErrors(pub Vec<String>);

impl MonitorConfig {
    /// Check the values `conf` cannot check on its own. Reports every problem, not just
    /// the first.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        let mut errors = Vec::new();

        if is_placeholder(&self.pushover.app_token) {
            errors.push("PUSHOVER_APP_TOKEN not configured".to_owned());
        }
        if is_placeholder(&self.pushover.user_key) {
            errors.push("PUSHOVER_USER_KEY not configured".to_owned());
        }
        if self.irc.server.trim().is_empty() {
            errors.push("IRC_SERVER not configured".to_owned());
        }
        if !self.irc.channel.starts_with('#') {
            errors.push(format!(
                "IRC_CHANNEL must start with '#' (got '{}')",
                self.irc.channel
            ));
        }
        if self.trigger.phrase.is_empty() {
            errors.push("TRIGGER_PHRASE must not be empty".to_owned());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigErrors(errors))
        }
    }
}

// Empty, or still the value from the example env file
fn is_placeholder(value: &str) -> bool {
    value.trim().is_empty() || value.to_ascii_lowercase().contains("your-")
}
