//! Reconnect loop around the topic monitor.

use crate::{
    monitor::{MonitorEvent, SessionEnd, TopicMonitor},
    session::{ChatSession, Connector, SessionError},
};
use std::{ops::ControlFlow, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs sessions one after another until shutdown.
pub struct Supervisor<C: Connector> {
    connector: C,
    monitor: TopicMonitor,
    token: CancellationToken,
    reconnect_delay: Duration,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(
        connector: C,
        monitor: TopicMonitor,
        token: CancellationToken,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            connector,
            monitor,
            token,
            reconnect_delay,
        }
    }

    /// Connect, run the session, and reconnect after `reconnect_delay` whenever it ends
    /// for any reason other than shutdown. Returns once `token` is cancelled.
    pub async fn run(&mut self) {
        loop {
            if self.token.is_cancelled() {
                return;
            }

            match self.connect_and_run().await {
                Ok(SessionEnd::Shutdown) => return,
                Ok(SessionEnd::Reconnect) => {
                    warn!("IRC session ended, reconnecting in {}s", self.reconnect_delay.as_secs());
                }
                Err(err) => {
                    error!("IRC session failed, reconnecting in {}s: {err}", self.reconnect_delay.as_secs());
                }
            }

            if self.token.is_cancelled() {
                return;
            }
            tokio::select! {
                _ = self.token.cancelled() => {
                    info!("Shutdown requested while waiting to reconnect");
                    return;
                }
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    /// One connection attempt, start to finish.
    async fn connect_and_run(&mut self) -> Result<SessionEnd, SessionError> {
        self.monitor.begin_session();

        let connected = tokio::select! {
            _ = self.token.cancelled() => {
                info!("Shutdown requested while connecting");
                self.monitor.mark_disconnected();
                return Ok(SessionEnd::Shutdown);
            }
            connected = self.connector.connect() => connected,
        };
        let mut session = match connected {
            Ok(session) => session,
            Err(err) => {
                self.monitor.mark_disconnected();
                return Err(err);
            }
        };

        loop {
            let event = tokio::select! {
                _ = self.token.cancelled() => MonitorEvent::Shutdown,
                next = session.next_event() => match next {
                    Some(Ok(event)) => event,
                    Some(Err(err)) => {
                        self.monitor.mark_disconnected();
                        return Err(err);
                    }
                    None => MonitorEvent::Disconnected,
                },
            };

            match self.monitor.handle_event(event, &mut session).await {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(end)) => return Ok(end),
                Err(err) => {
                    self.monitor.mark_disconnected();
                    return Err(err);
                }
            }
        }
    }

    /// The monitor, which outlives every session.
    pub fn monitor(&self) -> &TopicMonitor {
        &self.monitor
    }
}
