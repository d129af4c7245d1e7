use crate::kv::KvBatch;
use serde::Serialize;

/// What the plugin reports to the frontend.
///
/// Serializes as an object tagged by `what`, e.g.
/// `{"what":"update","song":{...},"status":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "what", rename_all = "lowercase")]
pub enum UpdateEvent {
    /// A connection attempt is starting.
    Connecting,
    /// The last session failed; a retry is scheduled.
    Error,
    /// The idle wait expired without a change.
    Timeout,
    /// Fresh `currentsong` and `status` replies.
    Update { song: KvBatch, status: KvBatch },
}

impl UpdateEvent {
    pub fn what(&self) -> &'static str {
        match self {
            UpdateEvent::Connecting => "connecting",
            UpdateEvent::Error => "error",
            UpdateEvent::Timeout => "timeout",
            UpdateEvent::Update { .. } => "update",
        }
    }
}
