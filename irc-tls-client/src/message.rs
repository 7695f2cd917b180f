//! Parsed inbound IRC lines.

use std::{fmt, str::FromStr};

/// The source of a message, e.g. `nick!user@host` or a bare server name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    /// Nickname, or the server name when the message came from the server itself.
    pub nick: String,
    /// Username (ident), if present.
    pub user: Option<String>,
    /// Hostname, if present.
    pub host: Option<String>,
}

impl Prefix {
    fn parse(s: &str) -> Self {
        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_owned())),
            None => (s, None),
        };
        let (nick, user) = match rest.split_once('!') {
            Some((nick, user)) => (nick, Some(user.to_owned())),
            None => (rest, None),
        };
        Self {
            nick: nick.to_owned(),
            user,
            host,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nick)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

/// One line received from the server.
///
/// IRCv3 message tags are accepted and discarded. The command is upper-cased, so numerics
/// stay as their three digits and word commands compare as `"TOPIC"`, `"KICK"` and so on.
/// A trailing parameter (the one introduced by `:`) is stored as the last entry of
/// `params` like any other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Message source, if the line carried one.
    pub prefix: Option<Prefix>,
    /// Command word or three-digit numeric.
    pub command: String,
    /// Command parameters, trailing parameter last.
    pub params: Vec<String>,
}

impl Message {
    /// Nickname of the sender, if the line had a prefix.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref().map(|p| p.nick.as_str())
    }

    /// Parameter at index `idx`, if present.
    pub fn param(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// The numeric reply code, if the command is a three-digit numeric.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }
}

impl FromStr for Message {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            let Some((_tags, after)) = tagged.split_once(' ') else {
                return Err(format!("missing command after tags: {line}"));
            };
            rest = after.trim_start_matches(' ');
        }

        let prefix = if let Some(source) = rest.strip_prefix(':') {
            let Some((source, after)) = source.split_once(' ') else {
                return Err(format!("missing command after prefix: {line}"));
            };
            rest = after.trim_start_matches(' ');
            Some(Prefix::parse(source))
        } else {
            None
        };

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(format!("empty command: {line:?}"));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_owned());
                break;
            }
            match rest.split_once(' ') {
                Some((param, after)) => {
                    params.push(param.to_owned());
                    rest = after;
                }
                None => {
                    params.push(rest.to_owned());
                    break;
                }
            }
        }

        Ok(Message {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}
