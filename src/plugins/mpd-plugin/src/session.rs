//! One live connection to the daemon.
//!
//! After the greeting and optional password exchange the session loops
//! forever: `currentsong`, `status`, report, `idle player mixer`, wait. It
//! only returns when something fails; the caller decides whether to retry.

use crate::error::MpdError;
use crate::event::UpdateEvent;
use crate::kv::KvBatch;
use crate::protocol::{self, classify, parse_greeting, strip_trailing_newlines, Response};
use crate::transport::Transport;
use crate::wakeup::{wait_readable, Readiness};
use mpdstat_core::{Password, ReportSink};
use std::borrow::Cow;
use std::convert::Infallible;
use std::io::{BufRead, BufReader};
use std::os::unix::io::AsRawFd;
use std::time::{Duration, Instant};

const IDLE_COMMAND: &str = "idle player mixer";

/// Per-connection settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub password: Option<Password>,
    /// Bound on each wait for an idle response; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Polling,
    AwaitingIdle,
    Failed,
}

/// Progress through one response block.
///
/// A block is any number of data lines ended by `OK` or `ACK ...`. A read
/// failure or end of stream ends it too.
#[derive(Debug)]
pub enum BlockState {
    AwaitLine,
    Done,
    Errored(MpdError),
}

impl BlockState {
    /// State after receiving `line`; data lines are passed to `on_data`.
    pub fn on_line(line: &str, on_data: &mut dyn FnMut(&str)) -> BlockState {
        match classify(line) {
            Response::Ok => BlockState::Done,
            Response::Ack(message) => BlockState::Errored(MpdError::ack(message)),
            Response::Data(data) => {
                on_data(data);
                BlockState::AwaitLine
            }
        }
    }
}

struct Connection {
    reader: BufReader<Transport>,
    line: Vec<u8>,
}

impl Connection {
    fn new(transport: Transport) -> Self {
        Self {
            reader: BufReader::new(transport),
            line: Vec::new(),
        }
    }

    fn read_line(&mut self) -> Result<Cow<'_, str>, MpdError> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Err(MpdError::Closed);
        }
        let line = String::from_utf8_lossy(&self.line);
        tracing::trace!(line = %strip_trailing_newlines(&line), "mpd ->");
        Ok(line)
    }

    fn write_command(&mut self, command: &str, args: &[&str]) -> Result<(), MpdError> {
        protocol::write_command(self.reader.get_mut(), command, args)?;
        Ok(())
    }

    fn read_block(&mut self, on_data: &mut dyn FnMut(&str)) -> Result<(), MpdError> {
        let mut state = BlockState::AwaitLine;
        loop {
            state = match state {
                BlockState::AwaitLine => match self.read_line() {
                    Ok(line) => BlockState::on_line(&line, on_data),
                    Err(err) => BlockState::Errored(err),
                },
                BlockState::Done => return Ok(()),
                BlockState::Errored(err) => return Err(err),
            };
        }
    }

    /// Whether input arrives within `timeout`. Buffered input counts.
    fn wait_readable(&self, timeout: Duration) -> Result<bool, MpdError> {
        if !self.reader.buffer().is_empty() {
            return Ok(true);
        }
        let fd = self.reader.get_ref().as_raw_fd();
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match wait_readable(fd, remaining)? {
                Readiness::Ready => return Ok(true),
                Readiness::TimedOut => return Ok(false),
                Readiness::Interrupted => continue,
            }
        }
    }
}

/// Protocol state for one connection. Dropping it closes the transport.
pub struct Session {
    conn: Connection,
    config: SessionConfig,
    state: SessionState,
    server_version: Option<String>,
    song: KvBatch,
    status: KvBatch,
}

impl Session {
    pub fn new(transport: Transport, config: SessionConfig) -> Self {
        Self {
            conn: Connection::new(transport),
            config,
            state: SessionState::Connecting,
            server_version: None,
            song: KvBatch::new(),
            status: KvBatch::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Protocol version from the greeting, once received.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Talk to the daemon until something fails, reporting as we go.
    pub fn run(&mut self, sink: &mut dyn ReportSink<UpdateEvent>) -> MpdError {
        match self.interact(sink) {
            Ok(never) => match never {},
            Err(err) => {
                self.transition(SessionState::Failed);
                err
            }
        }
    }

    fn interact(&mut self, sink: &mut dyn ReportSink<UpdateEvent>) -> Result<Infallible, MpdError> {
        self.handshake()?;
        loop {
            self.poll(sink)?;
            self.await_idle(sink)?;
        }
    }

    fn handshake(&mut self) -> Result<(), MpdError> {
        let line = self.conn.read_line()?;
        let version = match parse_greeting(&line) {
            Some(version) => version.to_string(),
            None => return Err(MpdError::BadGreeting(strip_trailing_newlines(&line).to_string())),
        };
        tracing::info!(version = %version, "mpd greeting received");
        self.server_version = Some(version);
        self.transition(SessionState::Authenticating);

        if let Some(password) = &self.config.password {
            self.conn.write_command("password", &[password.expose()])?;
            let line = self.conn.read_line()?;
            if classify(&line) != Response::Ok {
                return Err(MpdError::password_rejected(strip_trailing_newlines(&line)));
            }
            tracing::debug!("password accepted");
        }
        Ok(())
    }

    fn poll(&mut self, sink: &mut dyn ReportSink<UpdateEvent>) -> Result<(), MpdError> {
        self.transition(SessionState::Polling);

        self.conn.write_command("currentsong", &[])?;
        let song = &mut self.song;
        self.conn.read_block(&mut |line: &str| {
            song.append_if_kv(line);
        })?;

        self.conn.write_command("status", &[])?;
        let status = &mut self.status;
        self.conn.read_block(&mut |line: &str| {
            status.append_if_kv(line);
        })?;

        sink.report(UpdateEvent::Update {
            song: self.song.take(),
            status: self.status.take(),
        });
        Ok(())
    }

    fn await_idle(&mut self, sink: &mut dyn ReportSink<UpdateEvent>) -> Result<(), MpdError> {
        self.conn.write_command(IDLE_COMMAND, &[])?;
        self.transition(SessionState::AwaitingIdle);

        if let Some(timeout) = self.config.timeout {
            while !self.conn.wait_readable(timeout)? {
                sink.report(UpdateEvent::Timeout);
            }
        }
        self.conn.read_block(&mut |_: &str| {})
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "mpd session state");
            self.state = next;
        }
    }
}
