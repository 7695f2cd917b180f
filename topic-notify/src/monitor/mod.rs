//! The topic monitor state machine.
//!
//! [`TopicMonitor`] consumes [`MonitorEvent`]s one at a time on a single task. It owns the
//! topic and the notification cooldown, both of which outlive individual sessions, and
//! the only [`StatusReporter`]. All outbound traffic goes through the [`ChatSession`]
//! passed to each call, which can only JOIN, change NICK and QUIT.

use crate::{
    config::{MonitorConfig, NotificationConfig},
    cooldown::Cooldown,
    human_duration::HumanDuration,
    notify::{NotificationPayload, NotificationSink},
    session::{ChatSession, SessionError},
    status::{StatusHandle, StatusReporter},
    trigger::TriggerConfig,
};
use chrono::{DateTime, Utc};
use std::{ops::ControlFlow, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod event;
pub use event::MonitorEvent;

/// Quit message sent on shutdown.
pub const QUIT_REASON: &str = "Shutting down";

const TOPIC_LOG_CHARS: usize = 100;

/// Where the monitor is in the session lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Disconnected,
    Connecting,
    Connected,
    Joined,
    ShuttingDown,
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Shutdown was requested. Do not reconnect.
    Shutdown,
    /// The connection was lost. Reconnect after the backoff.
    Reconnect,
}

/// Watches one channel's topic and sends an alert when it contains the trigger phrase.
pub struct TopicMonitor {
    channel: String,
    configured_nickname: String,
    nickname: String,
    trigger: TriggerConfig,
    notification: NotificationConfig,
    rejoin_delay: Duration,
    sink: Arc<dyn NotificationSink>,
    status: StatusReporter,
    token: CancellationToken,
    state: MonitorState,
    shutdown_requested: bool,
    topic: Option<String>,
    cooldown: Cooldown,
}

impl TopicMonitor {
    /// Create a monitor. `token` is checked while waiting to rejoin after a kick.
    pub fn new(
        config: &MonitorConfig,
        sink: Arc<dyn NotificationSink>,
        status: StatusReporter,
        token: CancellationToken,
    ) -> Self {
        Self {
            channel: config.irc.channel.clone(),
            configured_nickname: config.irc.nickname.clone(),
            nickname: config.irc.nickname.clone(),
            trigger: config.trigger.clone(),
            notification: config.notification.clone(),
            rejoin_delay: config.irc.rejoin_delay,
            sink,
            status,
            token,
            state: MonitorState::Disconnected,
            shutdown_requested: false,
            topic: None,
            cooldown: Cooldown::new(config.notification.cooldown),
        }
    }

    /// Reset the per-session state before a connection attempt.
    /// The topic and cooldown are kept.
    pub fn begin_session(&mut self) {
        self.state = MonitorState::Connecting;
        self.shutdown_requested = false;
        self.nickname = self.configured_nickname.clone();
        self.status.set_connected(false);
        self.status.set_channel_joined(false);
    }

    /// Record that the connection is gone without going through an event.
    pub fn mark_disconnected(&mut self) {
        self.status.set_connected(false);
        self.status.set_channel_joined(false);
        if self.state != MonitorState::ShuttingDown {
            self.state = MonitorState::Disconnected;
        }
    }

    /// Handle one event using the wall clock.
    pub async fn handle_event<S: ChatSession + ?Sized>(
        &mut self,
        event: MonitorEvent,
        session: &mut S,
    ) -> Result<ControlFlow<SessionEnd>, SessionError> {
        self.handle_event_at(event, Utc::now(), session).await
    }

    /// Handle one event as if it arrived at `now`.
    ///
    /// Returns `Break` when the session is over, and `Err` if a command could not be
    /// sent, in which case the session should be treated as lost.
    pub async fn handle_event_at<S: ChatSession + ?Sized>(
        &mut self,
        event: MonitorEvent,
        now: DateTime<Utc>,
        session: &mut S,
    ) -> Result<ControlFlow<SessionEnd>, SessionError> {
        match event {
            MonitorEvent::Welcome { nickname } => {
                info!("Registered as {nickname}, joining {}", self.channel);
                self.nickname = nickname;
                self.status.set_connected(true);
                self.state = MonitorState::Connected;
                session.join(&self.channel).await?;
            }
            MonitorEvent::NicknameInUse => {
                self.nickname.push('_');
                warn!("Nickname in use, trying {}", self.nickname);
                session.nick(&self.nickname).await?;
            }
            MonitorEvent::Joined { nickname, channel } => {
                if !self.is_own_channel(&channel) {
                    return Ok(ControlFlow::Continue(()));
                }
                if nickname.eq_ignore_ascii_case(&self.nickname) {
                    info!("Joined {channel}");
                    self.status.set_channel_joined(true);
                    self.state = MonitorState::Joined;
                } else {
                    debug!("{nickname} joined {channel}");
                }
            }
            MonitorEvent::InitialTopic { channel, topic } => {
                if !self.is_own_channel(&channel) {
                    return Ok(ControlFlow::Continue(()));
                }
                info!("Current topic: {}", preview(&topic));
                self.topic = Some(topic);
                self.evaluate_trigger(now).await;
            }
            MonitorEvent::TopicChanged {
                channel,
                topic,
                changed_by,
            } => {
                if !self.is_own_channel(&channel) {
                    return Ok(ControlFlow::Continue(()));
                }
                if self.topic.as_deref() == Some(topic.as_str()) {
                    debug!("Topic set to the same text, ignoring");
                    return Ok(ControlFlow::Continue(()));
                }
                info!(
                    "Topic changed by {}: {}",
                    changed_by.as_deref().unwrap_or("unknown"),
                    preview(&topic)
                );
                self.topic = Some(topic);
                self.evaluate_trigger(now).await;
            }
            MonitorEvent::Kicked {
                channel,
                nickname,
                kicked_by,
            } => {
                if !self.is_own_channel(&channel) || !nickname.eq_ignore_ascii_case(&self.nickname)
                {
                    return Ok(ControlFlow::Continue(()));
                }
                warn!(
                    "Kicked from {channel} by {}, rejoining in {}s",
                    kicked_by.as_deref().unwrap_or("unknown"),
                    self.rejoin_delay.as_secs()
                );
                self.status.set_channel_joined(false);
                self.state = MonitorState::Connected;

                tokio::select! {
                    _ = self.token.cancelled() => {
                        info!("Shutdown requested, not rejoining {channel}");
                        return Ok(ControlFlow::Continue(()));
                    }
                    _ = tokio::time::sleep(self.rejoin_delay) => {}
                }
                session.join(&self.channel).await?;
            }
            MonitorEvent::Disconnected => {
                self.mark_disconnected();
                if self.shutdown_requested || self.token.is_cancelled() {
                    info!("Disconnected");
                    return Ok(ControlFlow::Break(SessionEnd::Shutdown));
                }
                warn!("Disconnected from server");
                return Ok(ControlFlow::Break(SessionEnd::Reconnect));
            }
            MonitorEvent::ProtocolError(msg) => {
                error!("IRC error: {msg}");
            }
            MonitorEvent::Shutdown => {
                info!("Shutting down IRC session");
                self.shutdown_requested = true;
                self.state = MonitorState::ShuttingDown;
                if let Err(err) = session.quit(QUIT_REASON).await {
                    warn!("Could not send QUIT: {err}");
                }
                self.mark_disconnected();
                return Ok(ControlFlow::Break(SessionEnd::Shutdown));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn evaluate_trigger(&mut self, now: DateTime<Utc>) {
        let Some(topic) = &self.topic else {
            return;
        };
        if !self.trigger.matches(topic) {
            debug!("No trigger in topic");
            return;
        }
        warn!("TRIGGER DETECTED: '{}' found in topic", self.trigger.phrase);

        if !self.cooldown.may_fire(now) {
            match self.cooldown.remaining(now) {
                Some(left) => info!(
                    "Notification cooldown active, {} remaining",
                    HumanDuration(left)
                ),
                None => info!("Notification cooldown active"),
            }
            return;
        }

        let payload = NotificationPayload::alert(&self.notification);
        match self.sink.send(&payload, self.notification.timeout).await {
            Ok(()) => {
                self.cooldown.record_fired(now);
                info!("Notification sent");
            }
            Err(err) => {
                error!("Failed to send notification: {err}");
            }
        }
    }

    fn is_own_channel(&self, channel: &str) -> bool {
        channel.eq_ignore_ascii_case(&self.channel)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Last known topic.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Nickname in use for this session.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The notification cooldown.
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Whether a shutdown event has been handled in this session.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// A reader for the status flags.
    pub fn status_handle(&self) -> StatusHandle {
        self.status.handle()
    }
}

fn preview(topic: &str) -> String {
    match topic.char_indices().nth(TOPIC_LOG_CHARS) {
        Some((idx, _)) => format!("{}...", &topic[..idx]),
        None => topic.to_owned(),
    }
}
