use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel value for `defect_count` meaning "not applicable / unknown".
/// Sentinel rows still count as events but contribute nothing to defect sums.
pub const DEFECTS_UNKNOWN: i32 = -1;

/// One raw event as submitted by the caller, shape-parsed but not yet
/// validated. `received_time` is deliberately absent: the ingestion boundary
/// assigns it, never the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubmission {
    pub event_id: String,
    pub event_time: DateTime<Utc>,
    pub machine_id: String,
    pub factory_id: String,
    pub line_id: String,
    pub duration_ms: i64,
    pub defect_count: i32,
}

/// A validated candidate awaiting conflict resolution: the submission plus
/// the `received_time` stamped from the batch's single clock read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub event_id: String,
    pub event_time: DateTime<Utc>,
    pub received_time: DateTime<Utc>,
    pub machine_id: String,
    pub factory_id: String,
    pub line_id: String,
    pub duration_ms: i64,
    pub defect_count: i32,
}

impl NormalizedEvent {
    pub fn from_submission(raw: EventSubmission, received_time: DateTime<Utc>) -> Self {
        Self {
            event_id: raw.event_id,
            event_time: raw.event_time,
            received_time,
            machine_id: raw.machine_id,
            factory_id: raw.factory_id,
            line_id: raw.line_id,
            duration_ms: raw.duration_ms,
            defect_count: raw.defect_count,
        }
    }
}

/// The single authoritative persisted record for an event id. Reflects the
/// latest-known state as ordered by `received_time`; replaced only by a
/// strictly newer candidate, never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub event_time: DateTime<Utc>,
    pub received_time: DateTime<Utc>,
    pub machine_id: String,
    pub factory_id: String,
    pub line_id: String,
    pub duration_ms: i64,
    pub defect_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    /// Materialize a freshly accepted candidate. Bookkeeping instants are
    /// stamped from the candidate's `received_time` so the store never reads
    /// a clock of its own.
    pub fn new(candidate: NormalizedEvent) -> Self {
        let stamp = candidate.received_time;
        Self {
            event_id: candidate.event_id,
            event_time: candidate.event_time,
            received_time: candidate.received_time,
            machine_id: candidate.machine_id,
            factory_id: candidate.factory_id,
            line_id: candidate.line_id,
            duration_ms: candidate.duration_ms,
            defect_count: candidate.defect_count,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    /// Overwrite the business fields with a newer candidate's, keeping
    /// `created_at`.
    pub fn apply_update(&mut self, candidate: &NormalizedEvent) {
        self.event_time = candidate.event_time;
        self.received_time = candidate.received_time;
        self.machine_id = candidate.machine_id.clone();
        self.factory_id = candidate.factory_id.clone();
        self.line_id = candidate.line_id.clone();
        self.duration_ms = candidate.duration_ms;
        self.defect_count = candidate.defect_count;
        self.updated_at = candidate.received_time;
    }

    /// Business-field equality against a candidate. `received_time` and the
    /// bookkeeping stamps are excluded: two deliveries of the same content at
    /// different times are still identical.
    pub fn is_identical(&self, candidate: &NormalizedEvent) -> bool {
        self.event_time == candidate.event_time
            && self.machine_id == candidate.machine_id
            && self.factory_id == candidate.factory_id
            && self.line_id == candidate.line_id
            && self.duration_ms == candidate.duration_ms
            && self.defect_count == candidate.defect_count
    }
}
