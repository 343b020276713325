use crate::domain::event::{EventRecord, NormalizedEvent};
use crate::domain::outcome::IngestCounts;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockWriteGuard};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("event not found")]
    NotFound,
}

/// Aggregate row for one machine over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineWindowTotals {
    pub events_count: i64,
    pub defects_count: i64,
}

/// Aggregate row for one production line over a time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDefectTotals {
    pub line_id: String,
    pub total_defects: i64,
    pub event_count: i64,
}

/// Durable keyed table of event records, one row per `event_id`.
///
/// Writers go through [`EventStore::begin_write`] (exclusive transaction,
/// used by the lock-then-compare strategy) or [`EventStore::merge_batch`]
/// (one-shot conditional upsert, used by the set-based strategy). Either way
/// a batch's writes land under a single write guard, so they are atomic with
/// respect to readers and to other batches. Aggregation reads take only the
/// read lock and may interleave with commits.
#[derive(Clone, Default)]
pub struct EventStore {
    inner: Arc<RwLock<HashMap<String, EventRecord>>>,
}

/// Exclusive write transaction over the table. Holding it blocks every other
/// writer, which is the in-memory analogue of locking the batch's rows with
/// `SELECT ... FOR UPDATE`; dropping it commits.
pub struct WriteTxn<'a> {
    table: RwLockWriteGuard<'a, HashMap<String, EventRecord>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin_write(&self) -> WriteTxn<'_> {
        WriteTxn {
            table: self.inner.write().await,
        }
    }

    pub async fn get(&self, event_id: &str) -> Result<EventRecord, StoreError> {
        let table = self.inner.read().await;
        table.get(event_id).cloned().ok_or(StoreError::NotFound)
    }

    /// Classify and conditionally upsert a deduplicated candidate set in one
    /// atomic pass, returning the outcome tallies from the same pass.
    ///
    /// Per candidate: no existing row inserts (`accepted`); an existing row
    /// with equal business fields counts `deduped` and never writes, even
    /// when the candidate is newer; otherwise the row is overwritten only if
    /// the candidate's `received_time` is strictly greater (`updated`). A
    /// stale candidate with different content falls through uncounted.
    pub async fn merge_batch(
        &self,
        candidates: Vec<NormalizedEvent>,
    ) -> Result<IngestCounts, StoreError> {
        let mut table = self.inner.write().await;
        let mut counts = IngestCounts::default();

        for candidate in candidates {
            match table.entry(candidate.event_id.clone()) {
                Entry::Vacant(slot) => {
                    counts.accepted += 1;
                    slot.insert(EventRecord::new(candidate));
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if existing.is_identical(&candidate) {
                        counts.deduped += 1;
                    } else if existing.received_time < candidate.received_time {
                        existing.apply_update(&candidate);
                        counts.updated += 1;
                    }
                }
            }
        }

        Ok(counts)
    }

    /// Events and summed defects for one machine over `[start, end)` of
    /// `event_time`. The `-1` defect sentinel contributes 0 to the sum but
    /// still counts as an event.
    pub async fn machine_window_totals(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MachineWindowTotals {
        let table = self.inner.read().await;
        let mut totals = MachineWindowTotals::default();

        for record in table.values() {
            if record.machine_id == machine_id
                && record.event_time >= start
                && record.event_time < end
            {
                totals.events_count += 1;
                if record.defect_count >= 0 {
                    totals.defects_count += i64::from(record.defect_count);
                }
            }
        }

        totals
    }

    /// Per-line defect totals for one factory over `[start, end)`, sorted by
    /// `total_defects` descending and truncated to `limit`. Ties order by
    /// `line_id` ascending so results are deterministic.
    pub async fn top_defect_lines(
        &self,
        factory_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Vec<LineDefectTotals> {
        let table = self.inner.read().await;
        let mut by_line: BTreeMap<&str, (i64, i64)> = BTreeMap::new();

        for record in table.values() {
            if record.factory_id == factory_id
                && record.event_time >= start
                && record.event_time < end
            {
                let entry = by_line.entry(record.line_id.as_str()).or_insert((0, 0));
                if record.defect_count >= 0 {
                    entry.0 += i64::from(record.defect_count);
                }
                entry.1 += 1;
            }
        }

        let mut lines: Vec<LineDefectTotals> = by_line
            .into_iter()
            .map(|(line_id, (total_defects, event_count))| LineDefectTotals {
                line_id: line_id.to_string(),
                total_defects,
                event_count,
            })
            .collect();

        lines.sort_by(|a, b| b.total_defects.cmp(&a.total_defects));
        lines.truncate(limit);
        lines
    }
}

impl WriteTxn<'_> {
    /// Snapshot the rows matching `event_ids`. Callers classify against the
    /// snapshot and write back through this same transaction, so the rows
    /// cannot move underneath them.
    pub fn select_for_update<'i, I>(&self, event_ids: I) -> HashMap<String, EventRecord>
    where
        I: IntoIterator<Item = &'i str>,
    {
        event_ids
            .into_iter()
            .filter_map(|id| self.table.get(id).map(|r| (id.to_string(), r.clone())))
            .collect()
    }

    pub fn insert(&mut self, record: EventRecord) {
        self.table.insert(record.event_id.clone(), record);
    }

    /// Overwrite an existing row's business fields with the candidate's.
    pub fn apply_update(&mut self, candidate: &NormalizedEvent) -> Result<(), StoreError> {
        let record = self
            .table
            .get_mut(&candidate.event_id)
            .ok_or(StoreError::NotFound)?;
        record.apply_update(candidate);
        Ok(())
    }
}
