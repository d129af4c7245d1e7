//! Reconnect loop around [`Session`].

use crate::error::{MpdError, SupervisorError};
use crate::event::UpdateEvent;
use crate::session::{Session, SessionConfig};
use crate::transport::Endpoint;
use crate::wakeup::RetryWait;
use mpdstat_core::ReportSink;
use std::convert::Infallible;
use std::time::Duration;

/// What to do after a failed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Stop for good on the first failure.
    Disabled,
    /// Wait this long (or until woken), then reconnect.
    After(Duration),
}

impl From<Option<Duration>> for RetryPolicy {
    fn from(interval: Option<Duration>) -> Self {
        interval.map_or(RetryPolicy::Disabled, RetryPolicy::After)
    }
}

/// Connects, runs a session until it fails, waits, and starts over.
///
/// There is no retry limit. The loop ends only when retrying is disabled or
/// the wait itself fails.
pub struct Supervisor<W> {
    endpoint: Endpoint,
    session: SessionConfig,
    retry: RetryPolicy,
    waiter: W,
}

impl<W: RetryWait> Supervisor<W> {
    pub fn new(endpoint: Endpoint, session: SessionConfig, retry: RetryPolicy, waiter: W) -> Self {
        Self {
            endpoint,
            session,
            retry,
            waiter,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn run(
        &mut self,
        sink: &mut dyn ReportSink<UpdateEvent>,
    ) -> Result<Infallible, SupervisorError> {
        loop {
            let err = self.attempt(sink);
            match err.ack_line() {
                Some(ack) => tracing::error!(
                    endpoint = %self.endpoint,
                    kind = ?err.kind(),
                    code = ack.code,
                    command = %ack.command,
                    error = %err,
                    "mpd connection failed"
                ),
                None => tracing::error!(
                    endpoint = %self.endpoint,
                    kind = ?err.kind(),
                    error = %err,
                    "mpd connection failed"
                ),
            }

            let interval = match self.retry {
                RetryPolicy::Disabled => return Err(SupervisorError::RetryDisabled { source: err }),
                RetryPolicy::After(interval) => interval,
            };

            sink.report(UpdateEvent::Error);
            tracing::info!(retry_in = ?interval, "waiting before reconnecting");
            let reason = self
                .waiter
                .wait(interval)
                .map_err(SupervisorError::Wait)?;
            tracing::debug!(?reason, "retry wait finished");
        }
    }

    // One connection attempt; always ends in an error.
    fn attempt(&self, sink: &mut dyn ReportSink<UpdateEvent>) -> MpdError {
        sink.report(UpdateEvent::Connecting);
        tracing::info!(endpoint = %self.endpoint, "connecting to mpd");
        match self.endpoint.open() {
            Ok(transport) => Session::new(transport, self.session.clone()).run(sink),
            Err(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::wakeup::WakeReason;
    use std::io;
    use std::path::PathBuf;

    /// Records requested waits and fails after `budget` of them.
    struct ScriptedWait {
        requested: Vec<Duration>,
        budget: usize,
    }

    impl RetryWait for ScriptedWait {
        fn wait(&mut self, timeout: Duration) -> io::Result<WakeReason> {
            if self.requested.len() == self.budget {
                return Err(io::Error::new(io::ErrorKind::Other, "wait broke"));
            }
            self.requested.push(timeout);
            Ok(WakeReason::Elapsed)
        }
    }

    fn unreachable_endpoint() -> (tempfile::TempDir, Endpoint) {
        let tmp = tempfile::tempdir().unwrap();
        let path: PathBuf = tmp.path().join("no-daemon.sock");
        (tmp, Endpoint::Unix(path))
    }

    #[test]
    fn retries_until_wait_fails() {
        let (_tmp, endpoint) = unreachable_endpoint();
        let waiter = ScriptedWait {
            requested: Vec::new(),
            budget: 3,
        };
        let interval = Duration::from_secs(7);
        let mut supervisor = Supervisor::new(
            endpoint,
            SessionConfig::default(),
            RetryPolicy::After(interval),
            waiter,
        );
        let mut events = Vec::new();
        let result = supervisor.run(&mut |event: UpdateEvent| events.push(event));

        assert!(matches!(result, Err(SupervisorError::Wait(_))));
        assert_eq!(supervisor.waiter.requested, vec![interval; 3]);
        let expected: Vec<_> = std::iter::repeat([UpdateEvent::Connecting, UpdateEvent::Error])
            .take(4)
            .flatten()
            .collect();
        assert_eq!(events, expected);
    }

    #[test]
    fn disabled_retry_is_fatal_without_error_event() {
        let (_tmp, endpoint) = unreachable_endpoint();
        let waiter = ScriptedWait {
            requested: Vec::new(),
            budget: 10,
        };
        let mut supervisor =
            Supervisor::new(endpoint, SessionConfig::default(), RetryPolicy::Disabled, waiter);
        let mut events = Vec::new();
        let result = supervisor.run(&mut |event: UpdateEvent| events.push(event));

        match result {
            Err(SupervisorError::RetryDisabled { source }) => {
                assert_eq!(source.kind(), ErrorKind::Connect)
            }
            other => panic!("expected RetryDisabled, got {other:?}"),
        }
        assert_eq!(events, vec![UpdateEvent::Connecting]);
        assert!(supervisor.waiter.requested.is_empty());
    }

    #[test]
    fn policy_from_optional_interval() {
        assert_eq!(RetryPolicy::from(None), RetryPolicy::Disabled);
        assert_eq!(
            RetryPolicy::from(Some(Duration::from_secs(10))),
            RetryPolicy::After(Duration::from_secs(10))
        );
    }
}
