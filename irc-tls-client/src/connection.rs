//! A registered IRC connection.

use crate::{Command, IrcCodec, Message};
use futures_util::{SinkExt, StreamExt};
use std::{io, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore, pki_types::ServerName},
};
use tokio_util::codec::Framed;
use tracing::{debug, info};

/// Where to connect and who to register as.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Server hostname. Also used for certificate verification.
    pub server: String,
    /// TLS port, usually 6697.
    pub port: u16,
    /// Nickname to register with.
    pub nickname: String,
    /// Real name (gecos) to register with.
    pub realname: String,
    /// Limit on TCP connect, TLS handshake and sending registration together.
    pub connect_timeout: Duration,
}

/// A framed IRC connection.
///
/// `PING` from the server is answered inside [`Connection::next_message`] and never
/// surfaces to the caller.
pub struct Connection<S = TlsStream<TcpStream>> {
    framed: Framed<S, IrcCodec>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-established stream. Nothing is sent until [`Connection::register`].
    pub fn new(io: S) -> Self {
        Self {
            framed: Framed::new(io, IrcCodec::default()),
        }
    }

    /// Send `NICK` and `USER` to begin registration.
    pub async fn register(&mut self, nickname: &str, realname: &str) -> io::Result<()> {
        self.send(Command::Nick(nickname.to_owned())).await?;
        self.send(Command::User {
            username: nickname.to_owned(),
            realname: realname.to_owned(),
        })
        .await
    }

    /// Send one command and flush it.
    pub async fn send(&mut self, cmd: Command) -> io::Result<()> {
        debug!("IRC Tx: {cmd}");
        self.framed.send(cmd).await
    }

    /// Next message from the server, or `None` once the server closed the connection.
    pub async fn next_message(&mut self) -> Option<io::Result<Message>> {
        loop {
            let msg = match self.framed.next().await? {
                Ok(msg) => msg,
                Err(err) => return Some(Err(err)),
            };

            if msg.command == "PING" {
                let token = msg.param(0).unwrap_or_default().to_owned();
                if let Err(err) = self.send(Command::Pong(token)).await {
                    return Some(Err(err));
                }
                continue;
            }

            return Some(Ok(msg));
        }
    }
}

/// Open a TCP connection, wrap it in TLS verified against the webpki roots for
/// `config.server`, and send registration.
///
/// Fails with [`io::ErrorKind::TimedOut`] if all of that takes longer than
/// `config.connect_timeout`. A rustls crypto provider must have been installed for the
/// process.
pub async fn connect_tls(config: &ConnectionConfig) -> io::Result<Connection> {
    info!("Connecting to {}:{} (TLS)", config.server, config.port);
    tokio::time::timeout(config.connect_timeout, open_tls(config))
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!(
                    "no connection to {}:{} after {}s",
                    config.server,
                    config.port,
                    config.connect_timeout.as_secs()
                ),
            )
        })?
}

async fn open_tls(config: &ConnectionConfig) -> io::Result<Connection> {
    let tcp = TcpStream::connect((config.server.as_str(), config.port)).await?;

    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let server_name = ServerName::try_from(config.server.clone())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let stream = TlsConnector::from(Arc::new(tls_config))
        .connect(server_name, tcp)
        .await?;

    let mut conn = Connection::new(stream);
    conn.register(&config.nickname, &config.realname).await?;
    Ok(conn)
}
