use serde::{Deserialize, Serialize};

/// Why a raw event was rejected during validation. Serialized verbatim into
/// the batch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    InvalidDuration,
    EventTimeTooFarInFuture,
    MalformedRequest,
}

/// A single rejected event and the first rule it tripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRejection {
    pub event_id: String,
    pub reason: RejectionReason,
}

impl EventRejection {
    pub fn new(event_id: impl Into<String>, reason: RejectionReason) -> Self {
        Self {
            event_id: event_id.into(),
            reason,
        }
    }
}

/// Per-outcome tallies from one conflict-resolution pass. Together with the
/// rejection count these partition a batch: every distinct non-rejected
/// identifier lands in exactly one bucket (stale-but-different candidates
/// excepted, which deliberately fall through uncounted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounts {
    pub accepted: u64,
    pub updated: u64,
    pub deduped: u64,
}

/// Full result of one ingested batch.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub counts: IngestCounts,
    pub rejections: Vec<EventRejection>,
}

impl IngestReport {
    pub fn rejected(&self) -> u64 {
        self.rejections.len() as u64
    }
}
