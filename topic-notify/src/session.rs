//! The protocol session as seen by the monitor.
//!
//! [`ChatSession`] is deliberately narrow: it yields [`MonitorEvent`]s and accepts JOIN,
//! NICK and QUIT. There is no way to send a channel message through it.

use crate::{config::IrcConfig, monitor::MonitorEvent};
use async_trait::async_trait;
use irc_tls_client::{Command, Connection, ConnectionConfig, Message, connect_tls};
use std::io;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tokio_rustls::client::TlsStream;
use tracing::{debug, trace};

const ERR_NICKNAMEINUSE: u16 = 433;

/// Why a session stopped producing events.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Could not establish the connection.
    #[error("connection failed: {0}")]
    Connect(io::Error),
    /// The established connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One connected, registering or registered session.
#[async_trait]
pub trait ChatSession: Send {
    /// Next event, or `None` once the server has closed the connection.
    async fn next_event(&mut self) -> Option<Result<MonitorEvent, SessionError>>;
    /// Join `channel`.
    async fn join(&mut self, channel: &str) -> Result<(), SessionError>;
    /// Ask for a different nickname.
    async fn nick(&mut self, nickname: &str) -> Result<(), SessionError>;
    /// Leave the server.
    async fn quit(&mut self, reason: &str) -> Result<(), SessionError>;
}

/// Opens sessions. Called once per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The session type produced.
    type Session: ChatSession;
    /// Connect and begin registration.
    async fn connect(&self) -> Result<Self::Session, SessionError>;
}

/// [`ChatSession`] over an IRC connection.
pub struct IrcSession<S = TlsStream<TcpStream>> {
    conn: Connection<S>,
}

impl<S> IrcSession<S> {
    pub fn new(conn: Connection<S>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<S> ChatSession for IrcSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn next_event(&mut self) -> Option<Result<MonitorEvent, SessionError>> {
        loop {
            let msg = match self.conn.next_message().await? {
                Ok(msg) => msg,
                Err(err) => return Some(Err(err.into())),
            };
            match translate(&msg) {
                Some(event) => return Some(Ok(event)),
                None => trace!("IRC Rx (ignored): {} {:?}", msg.command, msg.params),
            }
        }
    }

    async fn join(&mut self, channel: &str) -> Result<(), SessionError> {
        Ok(self.conn.send(Command::Join(channel.to_owned())).await?)
    }

    async fn nick(&mut self, nickname: &str) -> Result<(), SessionError> {
        Ok(self.conn.send(Command::Nick(nickname.to_owned())).await?)
    }

    async fn quit(&mut self, reason: &str) -> Result<(), SessionError> {
        Ok(self.conn.send(Command::Quit(Some(reason.to_owned()))).await?)
    }
}

/// Opens TLS IRC sessions.
#[derive(Clone, Debug)]
pub struct IrcConnector {
    config: ConnectionConfig,
}

impl IrcConnector {
    pub fn new(config: &IrcConfig) -> Self {
        Self {
            config: config.connection(),
        }
    }
}

#[async_trait]
impl Connector for IrcConnector {
    type Session = IrcSession;

    async fn connect(&self) -> Result<IrcSession, SessionError> {
        let conn = connect_tls(&self.config)
            .await
            .map_err(SessionError::Connect)?;
        debug!("Registered as {}", self.config.nickname);
        Ok(IrcSession::new(conn))
    }
}

/// Map a server line to the event the monitor cares about, if any.
pub fn translate(msg: &Message) -> Option<MonitorEvent> {
    let owned = |idx| msg.param(idx).map(str::to_owned);
    let source = msg.source_nick().map(str::to_owned);

    match msg.numeric() {
        Some(1) => {
            return Some(MonitorEvent::Welcome {
                nickname: owned(0)?,
            });
        }
        Some(ERR_NICKNAMEINUSE) => return Some(MonitorEvent::NicknameInUse),
        // RPL_TOPIC: <me> <channel> :<topic>
        Some(332) => {
            return Some(MonitorEvent::InitialTopic {
                channel: owned(1)?,
                topic: owned(2).unwrap_or_default(),
            });
        }
        Some(code @ 400..=599) => {
            // Skip our own nick, which every numeric starts with
            let text = msg.params.get(1..).unwrap_or_default().join(" ");
            return Some(MonitorEvent::ProtocolError(format!("{code} {text}")));
        }
        Some(_) => return None,
        None => {}
    }

    match msg.command.as_str() {
        "JOIN" => Some(MonitorEvent::Joined {
            nickname: source?,
            channel: owned(0)?,
        }),
        "TOPIC" => Some(MonitorEvent::TopicChanged {
            channel: owned(0)?,
            topic: owned(1).unwrap_or_default(),
            changed_by: source,
        }),
        "KICK" => Some(MonitorEvent::Kicked {
            channel: owned(0)?,
            nickname: owned(1)?,
            kicked_by: source,
        }),
        "ERROR" => Some(MonitorEvent::ProtocolError(
            owned(0).unwrap_or_else(|| "unknown error".to_owned()),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    fn event(line: &str) -> Option<MonitorEvent> {
        translate(&line.parse::<Message>().unwrap())
    }

    #[test]
    fn test_translate_registration() {
        assert_eq!(
            event(":irc.example.net 001 TopicWatcher_ :Welcome to the network"),
            Some(MonitorEvent::Welcome {
                nickname: "TopicWatcher_".into()
            })
        );
        assert_eq!(
            event(":irc.example.net 433 * TopicWatcher :Nickname is already in use"),
            Some(MonitorEvent::NicknameInUse)
        );
        assert_eq!(event(":irc.example.net 002 me :Your host is ..."), None);
        assert_eq!(event(":irc.example.net 375 me :- MOTD -"), None);
    }

    #[test]
    fn test_translate_channel_events() {
        assert_eq!(
            event(":TopicWatcher!~tw@host JOIN #test"),
            Some(MonitorEvent::Joined {
                nickname: "TopicWatcher".into(),
                channel: "#test".into()
            })
        );
        assert_eq!(
            event(":irc.example.net 332 TopicWatcher #test :Server: ONLINE"),
            Some(MonitorEvent::InitialTopic {
                channel: "#test".into(),
                topic: "Server: ONLINE".into()
            })
        );
        assert_eq!(
            event(":op!~op@host TOPIC #test :Server: OFFLINE"),
            Some(MonitorEvent::TopicChanged {
                channel: "#test".into(),
                topic: "Server: OFFLINE".into(),
                changed_by: Some("op".into())
            })
        );
        assert_eq!(
            event(":op!~op@host TOPIC #test :"),
            Some(MonitorEvent::TopicChanged {
                channel: "#test".into(),
                topic: String::new(),
                changed_by: Some("op".into())
            })
        );
        assert_eq!(
            event(":op!~op@host KICK #test TopicWatcher :bye"),
            Some(MonitorEvent::Kicked {
                channel: "#test".into(),
                nickname: "TopicWatcher".into(),
                kicked_by: Some("op".into())
            })
        );
        assert_eq!(event(":someone!~s@host PRIVMSG #test :hello"), None);
        assert_eq!(event(":someone!~s@host NOTICE #test :hello"), None);
    }

    #[test]
    fn test_translate_errors() {
        assert_eq!(
            event("ERROR :Closing Link: host (Ping timeout)"),
            Some(MonitorEvent::ProtocolError(
                "Closing Link: host (Ping timeout)".into()
            ))
        );
        assert_eq!(
            event(":irc.example.net 474 TopicWatcher #test :Cannot join channel (+b)"),
            Some(MonitorEvent::ProtocolError(
                "474 #test Cannot join channel (+b)".into()
            ))
        );
    }

    #[test]
    fn test_translate_requires_params() {
        assert_eq!(event(":irc.example.net 001"), None);
        assert_eq!(event("JOIN #test"), None);
        assert_eq!(event(":op!~op@host KICK #test"), None);
    }

    #[tokio::test]
    async fn test_irc_session_events_and_commands() {
        let (client_io, server_io) = duplex(4096);
        let mut session = IrcSession::new(Connection::new(client_io));
        let (server_rx, mut server_tx) = tokio::io::split(server_io);
        let mut server_rx = BufReader::new(server_rx).lines();

        server_tx
            .write_all(
                b":srv NOTICE * :*** Looking up your hostname\r\n\
                  PING :srv\r\n\
                  :srv 001 TopicWatcher :Welcome\r\n",
            )
            .await
            .unwrap();

        assert_eq!(
            session.next_event().await.unwrap().unwrap(),
            MonitorEvent::Welcome {
                nickname: "TopicWatcher".into()
            }
        );
        assert_eq!(server_rx.next_line().await.unwrap().unwrap(), "PONG :srv");

        session.join("#test").await.unwrap();
        session.nick("TopicWatcher_").await.unwrap();
        session.quit("Shutting down").await.unwrap();
        assert_eq!(server_rx.next_line().await.unwrap().unwrap(), "JOIN #test");
        assert_eq!(server_rx.next_line().await.unwrap().unwrap(), "NICK TopicWatcher_");
        assert_eq!(
            server_rx.next_line().await.unwrap().unwrap(),
            "QUIT :Shutting down"
        );

        drop(server_tx);
        drop(server_rx);
        assert!(session.next_event().await.is_none());
    }
}
