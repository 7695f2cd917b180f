//! irc-topic-notify binary - watches an IRC channel topic, alerts through Pushover.

#![deny(missing_docs)]

use conf::Conf;
use std::{env, fs, net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use topic_notify::{
    ConfigErrors, IrcConnector, MonitorConfig, NotificationConfig, NotificationPayload,
    NotificationSink, NotifyError, StatusReporter, Supervisor, TopicMonitor, TriggerConfig,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod health_http;

/// Top-level configuration for irc-topic-notify.
#[derive(Conf, Debug)]
#[conf(serde, test)]
pub struct Config {
    /// Path to a TOML config file (optional).
    /// This is parsed before other args, so config file values can be overridden by CLI args.
    #[allow(dead_code)] // Parsed early via find_parameter, kept here for --help
    #[conf(long)]
    config_file: Option<PathBuf>,
    /// If true, just validate config and don't start
    #[conf(long)]
    dry_run: bool,
    /// Send a test notification and exit
    #[conf(long)]
    test: bool,
    /// Report whether this topic would trigger an alert, and exit
    #[conf(long)]
    test_trigger: Option<String>,
    /// Socket to listen for health checks (GET /health)
    #[conf(long, env, default_value = "0.0.0.0:8080")]
    health_listen_addr: SocketAddr,
    #[conf(flatten, serde(flatten))]
    monitor: MonitorConfig,
}

/// What this invocation does, once the configuration is known to be valid.
#[derive(Debug, PartialEq, Eq)]
enum Mode {
    DryRun,
    TestTrigger(String),
    TestNotification,
    Monitor,
}

impl Config {
    /// Every mode needs a valid configuration, including the one-shot ones.
    fn mode(&self) -> Result<Mode, ConfigErrors> {
        self.monitor.validate()?;
        Ok(if self.dry_run {
            Mode::DryRun
        } else if let Some(topic) = &self.test_trigger {
            Mode::TestTrigger(topic.clone())
        } else if self.test {
            Mode::TestNotification
        } else {
            Mode::Monitor
        })
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    // Both aws-lc-rs and ring end up in the dependency tree, so rustls can't pick one itself
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "A rustls crypto provider was already installed")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv_found(dotenvy::dotenv())? {
        Some(path) => info!("Read dotenv file from: {}", path.display()),
        None => info!("Couldn't find a dotenv file"),
    }
    Ok(())
}

/// A missing .env file is fine. One that exists but can't be read or parsed is not.
fn dotenv_found(
    result: Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Log whether `topic` would trigger an alert, and return the answer.
fn report_trigger(trigger: &TriggerConfig, topic: &str) -> bool {
    let mode = if trigger.is_case_sensitive() {
        "case-sensitive"
    } else {
        "case-insensitive"
    };
    let matched = trigger.matches(topic);
    if matched {
        info!("MATCH: '{}' found in '{topic}' ({mode})", trigger.phrase);
    } else {
        info!("NO MATCH: '{}' not found in '{topic}' ({mode})", trigger.phrase);
    }
    matched
}

/// Send the self-test notification through `sink`.
async fn send_test_notification(
    config: &NotificationConfig,
    sink: &dyn NotificationSink,
) -> Result<(), NotifyError> {
    info!("Sending test notification");
    let payload = NotificationPayload::test(config);
    match sink.send(&payload, config.timeout).await {
        Ok(()) => {
            info!("Test notification sent");
            Ok(())
        }
        Err(err) => {
            error!("Test notification failed: {err}");
            Err(err)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    // Check for --config-file before the main parse, so we can load it and pass to conf
    let config_file_path = conf::find_parameter("config-file", env::args_os());

    let config = if let Some(config_path) = config_file_path {
        let path_display = config_path.to_string_lossy();
        let file_contents = fs::read_to_string(&config_path)
            .map_err(|err| format!("Could not open config file '{path_display}': {err}"))?;
        let doc: toml::Value = toml::from_str(&file_contents)
            .map_err(|err| format!("Config file '{path_display}' is not valid TOML: {err}"))?;
        info!("Loaded config file: {path_display}");
        Config::conf_builder().doc(path_display, doc).parse()
    } else {
        Config::parse()
    };

    info!("Config = {config:#?}");

    let mode = config.mode().inspect_err(|errors| {
        for err in &errors.0 {
            error!("Configuration error: {err}");
        }
    })?;

    let client = match mode {
        Mode::DryRun => return Ok(()),
        Mode::TestTrigger(topic) => {
            report_trigger(&config.monitor.trigger, &topic);
            return Ok(());
        }
        Mode::TestNotification => {
            let client = config.monitor.pushover.client()?;
            send_test_notification(&config.monitor.notification, &client).await?;
            return Ok(());
        }
        Mode::Monitor => config.monitor.pushover.client()?,
    };

    let irc = &config.monitor.irc;
    info!("IRC Topic Monitor starting");
    info!("Server: {}:{}", irc.server, irc.port);
    info!("Channel: {}", irc.channel);
    info!("Nickname: {}", irc.nickname);
    info!(
        "Trigger: '{}' ({})",
        config.monitor.trigger.phrase,
        if config.monitor.trigger.is_case_sensitive() {
            "case-sensitive"
        } else {
            "case-insensitive"
        }
    );
    info!(
        "Cooldown: {}",
        humantime::format_duration(config.monitor.notification.cooldown)
    );

    let token = CancellationToken::new();
    let status = StatusReporter::new();

    let listener = TcpListener::bind(config.health_listen_addr)
        .await
        .map_err(|err| format!("Could not listen on {}: {err}", config.health_listen_addr))?;
    info!("Listening for health checks on {}", config.health_listen_addr);
    let _health_task = health_http::start_health_task(listener, status.handle());

    let _signal_task = start_signal_task(token.clone());

    let monitor = TopicMonitor::new(&config.monitor, Arc::new(client), status, token.clone());
    let mut supervisor = Supervisor::new(
        IrcConnector::new(irc),
        monitor,
        token,
        irc.reconnect_delay,
    );

    // Returns once the token is canceled
    supervisor.run().await;

    info!("Goodbye!");
    Ok(())
}

fn start_signal_task(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(async move {
        wait_for_stop_signal().await;
        token.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_stop_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            error!("Could not listen for SIGTERM: {err}");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = sigterm.recv() => warn!("SIGTERM: Stop requested"),
    }
}

#[cfg(not(unix))]
async fn wait_for_stop_signal() {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("ctrl-c: Stop requested"),
        Err(err) => error!("Could not listen for ctrl-c, stopping: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conf::Conf;
    use std::{io, sync::Mutex, time::Duration};
    use topic_notify::notify::TEST_TITLE;

    /// Keeps every payload it is handed, then fails if `fail` is set.
    #[derive(Default)]
    struct MemorySink {
        fail: bool,
        sent: Mutex<Vec<NotificationPayload>>,
    }

    #[async_trait]
    impl NotificationSink for MemorySink {
        async fn send(
            &self,
            payload: &NotificationPayload,
            _timeout: Duration,
        ) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(payload.clone());
            if self.fail {
                Err(NotifyError("401 invalid token".into()))
            } else {
                Ok(())
            }
        }
    }

    const VALID: &str = r##"
[irc]
server = "irc.libera.chat"
channel = "#mychannel"

[trigger]
phrase = "ONLINE"

[notification]

[pushover]
app_token = "azGDORePK8gMaC0QOYAMyEEuzJnyUi"
user_key = "uQiRzpo4DXghDmr9QzzfQu27cmVRsG"
"##;

    fn parse(toml_config: &str) -> Config {
        let doc: toml::Value = toml::from_str(toml_config).expect("Failed to parse TOML");
        let empty_env: [(&str, &str); 0] = [];
        Config::conf_builder()
            .args(["."])
            .env(empty_env)
            .doc("test.toml", doc)
            .try_parse()
            .expect("Failed to parse config")
    }

    #[test]
    fn test_toml_config() {
        let config = parse(
            r##"
health_listen_addr = "127.0.0.1:9090"

[irc]
server = "irc.libera.chat"
channel = "#mychannel"
nickname = "watcher"
rejoin_delay = "45s"

[trigger]
phrase = "live now"
case_insensitive = true

[notification]
title = "Stream alert"
url = "https://example.com/stream"
cooldown = "10m"

[pushover]
app_token = "azGDORePK8gMaC0QOYAMyEEuzJnyUi"
user_key = "uQiRzpo4DXghDmr9QzzfQu27cmVRsG"
"##,
        );

        assert_eq!(config.health_listen_addr, "127.0.0.1:9090".parse().unwrap());
        assert!(!config.dry_run);
        assert!(!config.test);
        assert_eq!(config.test_trigger, None);
        assert_eq!(config.monitor.irc.server, "irc.libera.chat");
        assert_eq!(config.monitor.irc.port, 6697);
        assert_eq!(config.monitor.irc.nickname, "watcher");
        assert_eq!(config.monitor.irc.rejoin_delay, Duration::from_secs(45));
        assert!(config.monitor.trigger.matches("We are LIVE NOW"));
        assert_eq!(config.monitor.notification.title, "Stream alert");
        assert_eq!(config.monitor.notification.cooldown, Duration::from_secs(600));
        config.monitor.validate().unwrap();
    }

    #[test]
    fn test_default_health_addr_and_placeholder_credentials() {
        let config = parse(
            r##"
[irc]
server = "irc.libera.chat"
channel = "#mychannel"

[trigger]
phrase = "ONLINE"

[notification]

[pushover]
app_token = "your-app-token"
user_key = "your-user-key"
"##,
        );

        assert_eq!(config.health_listen_addr, "0.0.0.0:8080".parse().unwrap());
        let errors = config.monitor.validate().unwrap_err();
        assert_eq!(errors.0.len(), 2, "{errors}");
    }

    #[test]
    fn test_mode_priority() {
        let mut config = parse(VALID);
        assert_eq!(config.mode().unwrap(), Mode::Monitor);

        config.test = true;
        assert_eq!(config.mode().unwrap(), Mode::TestNotification);

        config.test_trigger = Some("Server: ONLINE".into());
        assert_eq!(
            config.mode().unwrap(),
            Mode::TestTrigger("Server: ONLINE".into())
        );

        config.dry_run = true;
        assert_eq!(config.mode().unwrap(), Mode::DryRun);
    }

    #[test]
    fn test_one_shot_modes_still_validate() {
        let mut config = parse(VALID);
        config.monitor.pushover.app_token = "your-app-token".into();

        config.test_trigger = Some("Server: ONLINE".into());
        let errors = config.mode().unwrap_err();
        assert_eq!(errors.0.len(), 1, "{errors}");

        config.test_trigger = None;
        config.test = true;
        assert!(config.mode().is_err());

        config.test = false;
        config.dry_run = true;
        assert!(config.mode().is_err());
    }

    #[test]
    fn test_report_trigger() {
        let exact = TriggerConfig::new("ONLINE", true);
        assert!(report_trigger(&exact, "Server: ONLINE"));
        assert!(!report_trigger(&exact, "Server: online"));
        assert!(!report_trigger(&exact, ""));

        let loose = TriggerConfig::new("ONLINE", false);
        assert!(report_trigger(&loose, "Server: online"));
        assert!(!report_trigger(&loose, "Server: OFFLINE soon"));
    }

    #[tokio::test]
    async fn test_send_test_notification_succeeds() {
        let sink = MemorySink::default();
        let config = NotificationConfig::default();

        send_test_notification(&config, &sink).await.unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, TEST_TITLE);
    }

    #[tokio::test]
    async fn test_send_test_notification_reports_failure() {
        let sink = MemorySink {
            fail: true,
            ..Default::default()
        };

        let err = send_test_notification(&NotificationConfig::default(), &sink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "401 invalid token");
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dotenv_found() {
        let path = PathBuf::from("/srv/app/.env");
        assert_eq!(dotenv_found(Ok(path.clone())).unwrap(), Some(path));

        let missing = dotenvy::Error::Io(io::ErrorKind::NotFound.into());
        assert_eq!(dotenv_found(Err(missing)).unwrap(), None);

        let unreadable = dotenvy::Error::Io(io::ErrorKind::PermissionDenied.into());
        assert!(matches!(
            dotenv_found(Err(unreadable)),
            Err(dotenvy::Error::Io(_))
        ));

        let bad_line = dotenvy::Error::LineParse("PUSHOVER_APP_TOKEN".into(), 18);
        assert!(matches!(
            dotenv_found(Err(bad_line)),
            Err(dotenvy::Error::LineParse(..))
        ));
    }
}
