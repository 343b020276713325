use crate::domain::event::NormalizedEvent;
use std::collections::HashMap;

/// Collapse a batch's candidates to one per identifier, keeping the candidate
/// with the greatest `received_time`. A later candidate replaces an earlier
/// one only when strictly newer; on a tie the first seen stays, which is
/// arbitrary and harmless since the whole batch shares one stamp. Guarantees
/// the conflict resolver never sees two writes for the same identifier from
/// one batch.
pub fn dedupe_batch(candidates: Vec<NormalizedEvent>) -> HashMap<String, NormalizedEvent> {
    let mut latest: HashMap<String, NormalizedEvent> = HashMap::with_capacity(candidates.len());

    for candidate in candidates {
        let keep = match latest.get(&candidate.event_id) {
            Some(existing) => candidate.received_time > existing.received_time,
            None => true,
        };
        if keep {
            latest.insert(candidate.event_id.clone(), candidate);
        }
    }

    latest
}
