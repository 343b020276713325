use crate::store::EventStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Average defect rate at or above this many defects per hour flags the
/// machine.
pub const WARNING_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
}

/// Windowed defect statistics for one machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineStats {
    pub machine_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub events_count: i64,
    pub defects_count: i64,
    pub avg_defect_rate: f64,
    pub status: HealthStatus,
}

pub struct MachineStatsService {
    store: EventStore,
}

impl MachineStatsService {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    /// Events and defects for `machine_id` with `event_time` in
    /// `[start, end)`, plus the average defect rate per whole hour of window.
    /// The window length truncates to whole hours; a zero-event or
    /// sub-one-hour window reports a rate of 0.0.
    pub async fn stats(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MachineStats {
        let totals = self.store.machine_window_totals(machine_id, start, end).await;

        let hours = (end - start).num_hours();
        let avg_defect_rate = if totals.events_count == 0 || hours == 0 {
            0.0
        } else {
            let rate = totals.defects_count as f64 / hours as f64;
            (rate * 100.0).round() / 100.0
        };

        let status = if avg_defect_rate >= WARNING_THRESHOLD {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        MachineStats {
            machine_id: machine_id.to_string(),
            start,
            end,
            events_count: totals.events_count,
            defects_count: totals.defects_count,
            avg_defect_rate,
            status,
        }
    }
}
