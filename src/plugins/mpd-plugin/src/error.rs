use crate::protocol::AckLine;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that end one connection attempt. The supervisor retries all of them.
#[derive(Debug, Error)]
pub enum MpdError {
    #[error("getaddrinfo: {host}:{port}: {source}")]
    Resolution {
        host: String,
        port: u16,
        source: io::Error,
    },
    #[error("socket path is too long: {}", path.display())]
    AddressTooLong { path: PathBuf },
    #[error("connect: {target}: {source}")]
    Connect { target: String, source: io::Error },
    #[error("can't connect to any of the candidates for {target}")]
    NoCandidates { target: String },
    #[error("server closed the connection")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("bad greeting: {0}")]
    BadGreeting(String),
    #[error("(password) server said: {line}")]
    PasswordRejected { line: String, ack: Option<AckLine> },
    #[error("server said: {line}")]
    Ack { line: String, ack: Option<AckLine> },
}

/// Coarse classification of [`MpdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Host name lookup failed.
    Resolution,
    /// The socket address could not be built.
    Address,
    /// No candidate address accepted the connection.
    Connect,
    /// A read, write or wait failed, or the peer hung up.
    Io,
    /// Bad greeting, ACK response or an unexpected line.
    Protocol,
}

impl MpdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MpdError::Resolution { .. } => ErrorKind::Resolution,
            MpdError::AddressTooLong { .. } => ErrorKind::Address,
            MpdError::Connect { .. } | MpdError::NoCandidates { .. } => ErrorKind::Connect,
            MpdError::Closed | MpdError::Io(_) => ErrorKind::Io,
            MpdError::BadGreeting(_)
            | MpdError::PasswordRejected { .. }
            | MpdError::Ack { .. } => ErrorKind::Protocol,
        }
    }

    /// An error for an `ACK` response; `line` has its terminator stripped.
    pub(crate) fn ack(line: &str) -> Self {
        MpdError::Ack {
            line: line.to_string(),
            ack: AckLine::parse(line),
        }
    }

    /// Like [`MpdError::ack`], for the reply to `password`.
    pub(crate) fn password_rejected(line: &str) -> Self {
        MpdError::PasswordRejected {
            line: line.to_string(),
            ack: AckLine::parse(line),
        }
    }

    /// The parsed `ACK [code@index] {command} message` line, when the server sent one.
    pub fn ack_line(&self) -> Option<&AckLine> {
        match self {
            MpdError::PasswordRejected { ack, .. } | MpdError::Ack { ack, .. } => ack.as_ref(),
            _ => None,
        }
    }
}

/// Failures that stop the supervisor for good.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("an error occurred; not retrying as requested: {source}")]
    RetryDisabled { source: MpdError },
    #[error("retry wait failed: {0}")]
    Wait(io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(MpdError::Closed.kind(), ErrorKind::Io);
        assert_eq!(MpdError::ack("x").kind(), ErrorKind::Protocol);
        assert_eq!(
            MpdError::AddressTooLong {
                path: PathBuf::from("/x")
            }
            .kind(),
            ErrorKind::Address
        );
        assert_eq!(
            MpdError::NoCandidates {
                target: "localhost:6600".into()
            }
            .kind(),
            ErrorKind::Connect
        );
    }

    #[test]
    fn ack_errors_keep_parsed_fields() {
        let err = MpdError::ack("ACK [50@1] {play} No such song");
        assert_eq!(err.to_string(), "server said: ACK [50@1] {play} No such song");
        let ack = err.ack_line().unwrap();
        assert_eq!((ack.code, ack.list_index), (50, 1));
        assert_eq!(ack.command, "play");
        assert_eq!(ack.message, "No such song");

        let odd = MpdError::password_rejected("ERR nope");
        assert_eq!(odd.kind(), ErrorKind::Protocol);
        assert!(odd.ack_line().is_none());
        assert!(MpdError::Closed.ack_line().is_none());
    }

    #[test]
    fn eof_message_is_distinct() {
        assert_eq!(MpdError::Closed.to_string(), "server closed the connection");
    }
}
