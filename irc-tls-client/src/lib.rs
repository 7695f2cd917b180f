#![deny(missing_docs)]

//! Minimal IRC client transport over TLS.
//!
//! This crate only knows how to frame and parse IRC lines, register a nickname, and keep
//! the link alive by answering `PING`. The set of commands it can put on the wire is
//! closed: see [`Command`]. In particular there is no way to send `PRIVMSG` or `NOTICE`,
//! so a program built on it cannot speak in a channel.
//!
//! Connect with [`connect_tls`], then call [`Connection::next_message`] in a loop.

mod codec;
pub use codec::IrcCodec;

mod command;
pub use command::Command;

mod connection;
pub use connection::{Connection, ConnectionConfig, connect_tls};

mod message;
pub use message::{Message, Prefix};
