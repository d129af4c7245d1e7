//! The contract between a status plugin and the frontend that displays it.
//!
//! A plugin is built from configuration (`init`), then `run` blocks for the
//! plugin's lifetime, handing every update to a [`ReportSink`]. Dropping the
//! plugin releases whatever it still holds (`destroy`).

use std::sync::mpsc;
use thiserror::Error;

/// Receives reported events in the order they are produced.
///
/// One `report` call corresponds to one begin/populate/end cycle on the
/// frontend. Calls are synchronous and never overlap.
pub trait ReportSink<E> {
    fn report(&mut self, event: E);
}

impl<E, F> ReportSink<E> for F
where
    F: FnMut(E),
{
    fn report(&mut self, event: E) {
        self(event)
    }
}

impl<E> ReportSink<E> for mpsc::Sender<E> {
    fn report(&mut self, event: E) {
        if self.send(event).is_err() {
            tracing::debug!("report receiver dropped; event discarded");
        }
    }
}

/// Failures that end a plugin's `run`.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid plugin configuration: {message}")]
    Config { message: String },
    #[error("{message}")]
    Fatal { message: String },
}

pub type PluginResult<T> = Result<T, PluginError>;

/// A long-running status source.
pub trait Plugin: Send {
    /// Event type handed to the frontend.
    type Event;

    /// Stable plugin identifier (e.g., "mpd").
    fn id(&self) -> &str;

    /// Run until a fatal error. Recoverable failures are handled inside.
    fn run(&mut self, sink: &mut dyn ReportSink<Self::Event>) -> PluginResult<()>;
}
