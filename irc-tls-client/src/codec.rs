//! Line framing for IRC.

use crate::{Command, Message};
use std::{fmt::Write as _, io};
use tokio_util::{
    bytes::{BufMut, BytesMut},
    codec::{Decoder, Encoder},
};
use tracing::warn;

/// Longest inbound line we buffer before giving up on the connection.
/// RFC 1459 says 512 bytes, IRCv3 tags push real-world lines well past that.
const DEFAULT_MAX_LINE_LENGTH: usize = 16 * 1024;

/// Longest outbound line, including CRLF.
const MAX_OUTBOUND_LINE_LENGTH: usize = 512;

/// Splits the byte stream on `\n`, tolerating a missing `\r`, and parses each line.
///
/// Lines that are not valid UTF-8 are decoded lossily. Lines that fail to parse are logged
/// and skipped; they never end the stream.
#[derive(Debug)]
pub struct IrcCodec {
    max_line_length: usize,
    /// Where to resume scanning for `\n` in the read buffer.
    next_index: usize,
}

impl IrcCodec {
    /// Codec with a custom inbound line limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            next_index: 0,
        }
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Message>, io::Error> {
        loop {
            let Some(offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') else {
                if buf.len() > self.max_line_length {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line exceeds {} bytes", self.max_line_length),
                    ));
                }
                self.next_index = buf.len();
                return Ok(None);
            };

            let line = buf.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\r', '\n']);
            if text.is_empty() {
                continue;
            }

            match text.parse::<Message>() {
                Ok(msg) => return Ok(Some(msg)),
                Err(err) => warn!("Skipping malformed IRC line: {err}"),
            }
        }
    }
}

impl Encoder<Command> for IrcCodec {
    type Error = io::Error;

    fn encode(&mut self, cmd: Command, buf: &mut BytesMut) -> Result<(), io::Error> {
        let mut line = String::new();
        write!(&mut line, "{cmd}\r\n").map_err(io::Error::other)?;
        if line.len() > MAX_OUTBOUND_LINE_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("outbound line exceeds {MAX_OUTBOUND_LINE_LENGTH} bytes"),
            ));
        }
        buf.reserve(line.len());
        buf.put(line.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_splits_lines_and_waits_for_more() {
        let mut codec = IrcCodec::default();
        let mut buf = BytesMut::from(&b"PING :a\r\n:s 001 me :Welcome\n:s 3"[..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.command, "PING");
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.numeric(), Some(1));
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"32 me #c :topic\r\n");
        let third = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(third.numeric(), Some(332));
        assert_eq!(third.param(2), Some("topic"));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_skips_blank_and_malformed_lines() {
        let mut codec = IrcCodec::default();
        let mut buf = BytesMut::from(&b"\r\n:only-a-prefix\r\nPING :x\r\n"[..]);
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.command, "PING");
    }

    #[test]
    fn decode_is_lossy_on_invalid_utf8() {
        let mut codec = IrcCodec::default();
        let mut buf = BytesMut::from(&b":op!o@h TOPIC #c :caf\xe9 ONLINE\r\n"[..]);
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert!(msg.param(1).unwrap().ends_with("ONLINE"));
    }

    #[test]
    fn decode_rejects_overlong_line() {
        let mut codec = IrcCodec::with_max_line_length(16);
        let mut buf = BytesMut::from(&[b'x'; 32][..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encode_appends_crlf() {
        let mut codec = IrcCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(Command::Join("#chan".into()), &mut buf).unwrap();
        assert_eq!(&buf[..], b"JOIN #chan\r\n");
    }

    #[test]
    fn encode_rejects_overlong_line() {
        let mut codec = IrcCodec::default();
        let mut buf = BytesMut::new();
        let reason = "x".repeat(600);
        assert!(codec.encode(Command::Quit(Some(reason)), &mut buf).is_err());
        assert!(buf.is_empty());
    }
}
