use crate::domain::event::EventSubmission;
use crate::domain::outcome::{IngestReport, RejectionReason};
use crate::service::{DefectLine, HealthStatus, MachineStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw event on the wire. Field names are camelCase to match the
/// established API; instants are RFC 3339.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventIn {
    pub event_id: String,
    pub event_time: DateTime<Utc>,
    pub machine_id: String,
    pub factory_id: String,
    pub line_id: String,
    pub duration_ms: i64,
    pub defect_count: i32,
}

impl RawEventIn {
    pub fn into_domain(self) -> EventSubmission {
        EventSubmission {
            event_id: self.event_id,
            event_time: self.event_time,
            machine_id: self.machine_id,
            factory_id: self.factory_id,
            line_id: self.line_id,
            duration_ms: self.duration_ms,
            defect_count: self.defect_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventBatchIn {
    pub events: Vec<RawEventIn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionOut {
    pub event_id: String,
    pub reason: RejectionReason,
}

#[derive(Debug, Serialize)]
pub struct EventBatchOut {
    pub accepted: u64,
    pub deduped: u64,
    pub updated: u64,
    pub rejected: u64,
    pub rejections: Vec<RejectionOut>,
}

impl From<IngestReport> for EventBatchOut {
    fn from(report: IngestReport) -> Self {
        Self {
            accepted: report.counts.accepted,
            deduped: report.counts.deduped,
            updated: report.counts.updated,
            rejected: report.rejected(),
            rejections: report
                .rejections
                .into_iter()
                .map(|r| RejectionOut {
                    event_id: r.event_id,
                    reason: r.reason,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatsQuery {
    pub machine_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatsOut {
    pub machine_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub events_count: i64,
    pub defects_count: i64,
    pub avg_defect_rate: f64,
    pub status: HealthStatus,
}

impl From<MachineStats> for MachineStatsOut {
    fn from(stats: MachineStats) -> Self {
        Self {
            machine_id: stats.machine_id,
            start: stats.start,
            end: stats.end,
            events_count: stats.events_count,
            defects_count: stats.defects_count,
            avg_defect_rate: stats.avg_defect_rate,
            status: stats.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDefectLinesQuery {
    pub factory_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectLineOut {
    pub line_id: String,
    pub total_defects: i64,
    pub event_count: i64,
    pub defects_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDefectLinesOut {
    pub defect_lines: Vec<DefectLineOut>,
}

impl From<Vec<DefectLine>> for TopDefectLinesOut {
    fn from(lines: Vec<DefectLine>) -> Self {
        Self {
            defect_lines: lines
                .into_iter()
                .map(|l| DefectLineOut {
                    line_id: l.line_id,
                    total_defects: l.total_defects,
                    event_count: l.event_count,
                    defects_percent: l.defects_percent,
                })
                .collect(),
        }
    }
}
