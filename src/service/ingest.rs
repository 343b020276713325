use crate::clock::Clock;
use crate::domain::error::IngestError;
use crate::domain::event::EventSubmission;
use crate::domain::outcome::{IngestCounts, IngestReport};
use crate::service::dedup::dedupe_batch;
use crate::service::resolver::ConflictResolver;
use crate::service::validate::validate_batch;
use crate::telemetry::Telemetry;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Batch ingestion front: validate, collapse intra-batch duplicates, hand the
/// survivors to the configured conflict resolver, and fold the rejection
/// accounting into the report. One batch is one store transaction; a store
/// failure aborts the whole batch with no partial counts.
#[derive(Clone)]
pub struct IngestService {
    resolver: Arc<dyn ConflictResolver>,
    clock: Arc<dyn Clock>,
    telemetry: Telemetry,
}

impl IngestService {
    pub fn new(resolver: Arc<dyn ConflictResolver>, clock: Arc<dyn Clock>, telemetry: Telemetry) -> Self {
        Self {
            resolver,
            clock,
            telemetry,
        }
    }

    pub async fn ingest(&self, events: Vec<EventSubmission>) -> Result<IngestReport, IngestError> {
        let started = Instant::now();
        let batch_size = events.len();

        // one clock read per batch: every candidate shares this received_time
        let now = self.clock.now();

        let (candidates, rejections) = validate_batch(events, now);
        let deduped = dedupe_batch(candidates);

        let counts = if deduped.is_empty() {
            IngestCounts::default()
        } else {
            self.resolver
                .resolve(deduped.into_values().collect())
                .await?
        };

        self.telemetry.events_accepted.inc_by(counts.accepted);
        self.telemetry.events_updated.inc_by(counts.updated);
        self.telemetry.events_deduped.inc_by(counts.deduped);
        self.telemetry.events_rejected.inc_by(rejections.len() as u64);
        self.telemetry.batches_ingested.inc();
        self.telemetry
            .ingest_duration
            .observe(started.elapsed().as_secs_f64());

        debug!(
            batch_size,
            accepted = counts.accepted,
            updated = counts.updated,
            deduped = counts.deduped,
            rejected = rejections.len(),
            "batch resolved"
        );

        Ok(IngestReport { counts, rejections })
    }
}
