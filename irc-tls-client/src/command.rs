//! Outbound IRC commands.

use std::fmt;

/// Every command this client can send.
///
/// Channel-content commands (`PRIVMSG`, `NOTICE`, CTCP actions) are not representable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `NICK <nickname>`
    Nick(String),
    /// `USER <username> 0 * :<realname>`
    User {
        /// Username (ident) to register with.
        username: String,
        /// Free-form real name.
        realname: String,
    },
    /// `JOIN <channel>`
    Join(String),
    /// `PONG :<token>`, the answer to a server `PING`.
    Pong(String),
    /// `QUIT [:<reason>]`
    Quit(Option<String>),
}

/// Strips line breaks and NUL so an argument can't smuggle a second command onto the wire.
struct Clean<'a>(&'a str);

impl fmt::Display for Clean<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars().filter(|c| !matches!(c, '\r' | '\n' | '\0')) {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Middle parameters also lose spaces.
struct Word<'a>(&'a str);

impl fmt::Display for Word<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self
            .0
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n' | '\0' | ' '))
        {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Nick(nick) => write!(f, "NICK {}", Word(nick)),
            Command::User { username, realname } => {
                write!(f, "USER {} 0 * :{}", Word(username), Clean(realname))
            }
            Command::Join(channel) => write!(f, "JOIN {}", Word(channel)),
            Command::Pong(token) => write!(f, "PONG :{}", Clean(token)),
            Command::Quit(None) => write!(f, "QUIT"),
            Command::Quit(Some(reason)) => write!(f, "QUIT :{}", Clean(reason)),
        }
    }
}
