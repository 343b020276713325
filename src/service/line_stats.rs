use crate::store::{EventStore, LineDefectTotals};
use chrono::{DateTime, Utc};

/// One line's position in the defect ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct DefectLine {
    pub line_id: String,
    pub total_defects: i64,
    pub event_count: i64,
    pub defects_percent: f64,
}

pub struct LineStatsService {
    store: EventStore,
}

impl LineStatsService {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    /// The factory's worst lines by total defects over `[start, end)`, at
    /// most `limit` of them, each annotated with defects per hundred events.
    pub async fn top_defect_lines(
        &self,
        factory_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Vec<DefectLine> {
        self.store
            .top_defect_lines(factory_id, start, end, limit)
            .await
            .into_iter()
            .map(to_defect_line)
            .collect()
    }
}

fn to_defect_line(totals: LineDefectTotals) -> DefectLine {
    let defects_percent = if totals.event_count == 0 {
        0.0
    } else {
        round_two_decimals(totals.total_defects as f64 * 100.0 / totals.event_count as f64)
    };

    DefectLine {
        line_id: totals.line_id,
        total_defects: totals.total_defects,
        event_count: totals.event_count,
        defects_percent,
    }
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::NormalizedEvent;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn event(event_id: &str, line_id: &str, defect_count: i32) -> NormalizedEvent {
        NormalizedEvent {
            event_id: event_id.to_string(),
            event_time: base_time() + Duration::hours(1),
            received_time: base_time(),
            machine_id: "M1".to_string(),
            factory_id: "F-1".to_string(),
            line_id: line_id.to_string(),
            duration_ms: 1000,
            defect_count,
        }
    }

    async fn seeded(events: Vec<NormalizedEvent>) -> LineStatsService {
        let store = EventStore::new();
        store.merge_batch(events).await.unwrap();
        LineStatsService::new(store)
    }

    #[tokio::test]
    async fn ranks_lines_and_derives_percentages() {
        // L-1: 8 defects over 2 events, L-2: 7 over 1
        let svc = seeded(vec![
            event("E-1", "L-1", 5),
            event("E-2", "L-1", 3),
            event("E-3", "L-2", 7),
        ])
        .await;

        let start = base_time();
        let end = start + Duration::hours(24);
        let lines = svc.top_defect_lines("F-1", start, end, 10).await;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_id, "L-1");
        assert_eq!(lines[0].total_defects, 8);
        assert_eq!(lines[0].event_count, 2);
        assert_eq!(lines[0].defects_percent, 400.0);
        assert_eq!(lines[1].line_id, "L-2");
        assert_eq!(lines[1].defects_percent, 700.0);
    }

    #[tokio::test]
    async fn percentage_rounds_to_two_decimals() {
        // 1 defect over 3 events: 33.333...%
        let svc = seeded(vec![
            event("E-1", "L-3", 1),
            event("E-2", "L-3", 0),
            event("E-3", "L-3", 0),
        ])
        .await;

        let start = base_time();
        let end = start + Duration::hours(24);
        let lines = svc.top_defect_lines("F-1", start, end, 1).await;

        assert_eq!(lines[0].defects_percent, 33.33);
    }

    #[tokio::test]
    async fn limit_truncates_the_ranking() {
        let svc = seeded(vec![
            event("E-1", "L-1", 1),
            event("E-2", "L-2", 2),
            event("E-3", "L-3", 3),
        ])
        .await;

        let start = base_time();
        let end = start + Duration::hours(24);
        let lines = svc.top_defect_lines("F-1", start, end, 2).await;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_id, "L-3");
        assert_eq!(lines[1].line_id, "L-2");
    }

    #[tokio::test]
    async fn sentinel_only_line_reports_zero_percent() {
        let svc = seeded(vec![event("E-1", "L-4", -1)]).await;

        let start = base_time();
        let end = start + Duration::hours(24);
        let lines = svc.top_defect_lines("F-1", start, end, 5).await;

        assert_eq!(lines[0].total_defects, 0);
        assert_eq!(lines[0].event_count, 1);
        assert_eq!(lines[0].defects_percent, 0.0);
    }
}
