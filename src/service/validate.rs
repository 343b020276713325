use crate::domain::event::{EventSubmission, NormalizedEvent, DEFECTS_UNKNOWN};
use crate::domain::outcome::{EventRejection, RejectionReason};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest plausible event duration: 6 hours.
pub const MAX_DURATION_MS: i64 = 6 * 60 * 60 * 1000;

/// How far into the future an `event_time` may lie before it is rejected.
pub const FUTURE_TOLERANCE_MINUTES: i64 = 15;

const MAX_ID_LEN: usize = 64;

static EVENT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^E-\d+$").expect("static pattern"));
static FACTORY_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^F-\d+$").expect("static pattern"));
static LINE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^L-\d+$").expect("static pattern"));

/// Split a batch into normalized candidates and rejections. `now` is read
/// once per batch by the caller, so every candidate shares one
/// `received_time` and one future-tolerance reference point.
///
/// Rules run in order, first match wins: shape, duration bounds, future
/// tolerance. Shape is normally enforced declaratively at the HTTP boundary;
/// it is re-checked here so malformed input degrades to a rejection instead
/// of poisoning the batch.
pub fn validate_batch(
    submissions: Vec<EventSubmission>,
    now: DateTime<Utc>,
) -> (Vec<NormalizedEvent>, Vec<EventRejection>) {
    let horizon = now + Duration::minutes(FUTURE_TOLERANCE_MINUTES);
    let mut candidates = Vec::with_capacity(submissions.len());
    let mut rejections = Vec::new();

    for raw in submissions {
        if !is_well_formed(&raw) {
            rejections.push(EventRejection::new(raw.event_id, RejectionReason::MalformedRequest));
            continue;
        }

        if raw.duration_ms < 0 || raw.duration_ms > MAX_DURATION_MS {
            rejections.push(EventRejection::new(raw.event_id, RejectionReason::InvalidDuration));
            continue;
        }

        if raw.event_time > horizon {
            rejections.push(EventRejection::new(
                raw.event_id,
                RejectionReason::EventTimeTooFarInFuture,
            ));
            continue;
        }

        candidates.push(NormalizedEvent::from_submission(raw, now));
    }

    (candidates, rejections)
}

fn is_well_formed(raw: &EventSubmission) -> bool {
    raw.event_id.len() <= MAX_ID_LEN
        && EVENT_ID_RE.is_match(&raw.event_id)
        && !raw.machine_id.is_empty()
        && raw.machine_id.len() <= MAX_ID_LEN
        && raw.factory_id.len() <= MAX_ID_LEN
        && FACTORY_ID_RE.is_match(&raw.factory_id)
        && raw.line_id.len() <= MAX_ID_LEN
        && LINE_ID_RE.is_match(&raw.line_id)
        && raw.defect_count >= DEFECTS_UNKNOWN
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn submission(event_id: &str) -> EventSubmission {
        EventSubmission {
            event_id: event_id.to_string(),
            event_time: now() - Duration::seconds(60),
            machine_id: "M1".to_string(),
            factory_id: "F-1".to_string(),
            line_id: "L-1".to_string(),
            duration_ms: 1000,
            defect_count: 0,
        }
    }

    #[test]
    fn accepts_and_stamps_received_time() {
        let (candidates, rejections) = validate_batch(vec![submission("E-1")], now());
        assert!(rejections.is_empty());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].received_time, now());
    }

    #[test]
    fn rejects_duration_out_of_bounds() {
        let mut too_long = submission("E-1");
        too_long.duration_ms = 7 * 60 * 60 * 1000;
        let mut negative = submission("E-2");
        negative.duration_ms = -1;
        let mut at_limit = submission("E-3");
        at_limit.duration_ms = MAX_DURATION_MS;

        let (candidates, rejections) = validate_batch(vec![too_long, negative, at_limit], now());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].event_id, "E-3");
        assert_eq!(rejections.len(), 2);
        assert!(rejections
            .iter()
            .all(|r| r.reason == RejectionReason::InvalidDuration));
    }

    #[test]
    fn rejects_event_time_beyond_tolerance() {
        let mut too_far = submission("E-1");
        too_far.event_time = now() + Duration::minutes(20);
        let mut at_horizon = submission("E-2");
        at_horizon.event_time = now() + Duration::minutes(15);

        let (candidates, rejections) = validate_batch(vec![too_far, at_horizon], now());

        // exactly at the horizon is not "after" it
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].event_id, "E-2");
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].reason, RejectionReason::EventTimeTooFarInFuture);
    }

    #[test]
    fn rejects_malformed_identifiers() {
        let mut bad_event_id = submission("EVT-1");
        bad_event_id.event_id = "EVT-1".to_string();
        let mut bad_factory = submission("E-2");
        bad_factory.factory_id = "factory-1".to_string();
        let mut bad_line = submission("E-3");
        bad_line.line_id = "".to_string();
        let mut bad_machine = submission("E-4");
        bad_machine.machine_id = "".to_string();
        let mut bad_defects = submission("E-5");
        bad_defects.defect_count = -2;

        let batch = vec![bad_event_id, bad_factory, bad_line, bad_machine, bad_defects];
        let (candidates, rejections) = validate_batch(batch, now());

        assert!(candidates.is_empty());
        assert_eq!(rejections.len(), 5);
        assert!(rejections
            .iter()
            .all(|r| r.reason == RejectionReason::MalformedRequest));
    }

    #[test]
    fn shape_check_wins_over_later_rules() {
        // malformed id and over-long duration: the shape rejection is reported
        let mut raw = submission("E-1");
        raw.event_id = "nope".to_string();
        raw.duration_ms = MAX_DURATION_MS + 1;

        let (_, rejections) = validate_batch(vec![raw], now());
        assert_eq!(rejections[0].reason, RejectionReason::MalformedRequest);
    }
}
