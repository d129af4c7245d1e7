//! Codec for MPD's line-based protocol.
//!
//! Commands are a name followed by space-separated arguments, terminated by a
//! newline. Responses are `key: value` data lines ending with a line that is
//! exactly `OK` or that starts with `ACK`.

use mpdstat_core::redact::redact_secrets;
use std::io::{self, Write};

/// Prefix of the line a server greets new connections with.
pub const GREETING_PREFIX: &str = "OK MPD ";

/// Classification of one response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// End of a successful response block.
    Ok,
    /// End of a failed response block; holds the line without its newline.
    Ack(&'a str),
    /// Anything else, usually `key: value`.
    Data(&'a str),
}

pub fn classify(line: &str) -> Response<'_> {
    let trimmed = strip_trailing_newlines(line);
    if trimmed == "OK" {
        Response::Ok
    } else if trimmed.starts_with("ACK") {
        Response::Ack(trimmed)
    } else {
        Response::Data(line)
    }
}

/// `line` without any trailing `\n` characters.
pub fn strip_trailing_newlines(line: &str) -> &str {
    line.trim_end_matches('\n')
}

/// Protocol version announced by a greeting line, if it is one.
pub fn parse_greeting(line: &str) -> Option<&str> {
    line.strip_prefix(GREETING_PREFIX)
        .map(|version| strip_trailing_newlines(version).trim())
}

/// Structured form of `ACK [code@index] {command} message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckLine {
    pub code: u32,
    pub list_index: u32,
    pub command: String,
    pub message: String,
}

impl AckLine {
    pub fn parse(line: &str) -> Option<Self> {
        let rest = strip_trailing_newlines(line).strip_prefix("ACK [")?;
        let (code, rest) = rest.split_once('@')?;
        let (list_index, rest) = rest.split_once("] {")?;
        let (command, message) = rest.split_once('}')?;
        Some(Self {
            code: code.parse().ok()?,
            list_index: list_index.parse().ok()?,
            command: command.to_string(),
            message: message.trim_start().to_string(),
        })
    }
}

/// Quote an argument: wrap it in double quotes, escaping `"` and `\`.
pub fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Parse a leading quoted argument, returning it and the remaining input.
pub fn unquote(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let mut arg = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => arg.push(chars.next()?.1),
            '"' => return Some((arg, &body[i + 1..])),
            _ => arg.push(c),
        }
    }
    None
}

/// Build the wire form of a command with quoted arguments.
pub fn encode_command(command: &str, args: &[&str]) -> String {
    let mut line = String::from(command);
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg));
    }
    line.push('\n');
    line
}

/// Write a command and flush, reporting any write error once at the end.
pub fn write_command<W: Write>(writer: &mut W, command: &str, args: &[&str]) -> io::Result<()> {
    let line = encode_command(command, args);
    tracing::trace!(line = %redact_secrets(strip_trailing_newlines(&line)), "mpd <-");
    writer.write_all(line.as_bytes())?;
    writer.flush()
}
