//! Music Player Daemon (MPD) status plugin.
//!
//! This crate provides:
//! - A transport opener for Unix-domain sockets and TCP endpoints
//! - A codec for MPD's line-based request/response protocol
//! - A session that polls `currentsong`/`status` and long-polls with `idle`
//! - A supervisor that reconnects forever, waiting between attempts
//!
//! # Reported events
//!
//! Every state change is handed to a [`ReportSink`](mpdstat_core::ReportSink)
//! as an [`UpdateEvent`]:
//!
//! ```text
//! connecting                      before each connection attempt
//! update { song, status }         after each poll of the daemon
//! timeout                         each time the idle wait expires
//! error                           after a failed session, before retrying
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mpd_plugin::MpdPlugin;
//! use mpdstat_core::{MpdConfig, Plugin};
//!
//! let mut plugin = MpdPlugin::init(&MpdConfig::default())?;
//! plugin.run(&mut |event| println!("{event:?}"))?;
//! ```

mod error;
mod event;
pub mod kv;
mod plugin;
pub mod protocol;
mod session;
mod supervisor;
mod transport;
pub mod wakeup;

pub use error::{ErrorKind, MpdError, SupervisorError};
pub use event::UpdateEvent;
pub use kv::KvBatch;
pub use plugin::MpdPlugin;
pub use session::{BlockState, Session, SessionConfig, SessionState};
pub use supervisor::{RetryPolicy, Supervisor};
pub use transport::{Endpoint, Transport};
pub use wakeup::{FifoWakeup, RetryWait, WakeReason};
