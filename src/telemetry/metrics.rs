use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// Ingestion metrics, one registry per service instance so tests stay
/// isolated. Counter names follow the batch outcome buckets.
#[derive(Clone)]
pub struct Telemetry {
    pub events_accepted: IntCounter,
    pub events_updated: IntCounter,
    pub events_deduped: IntCounter,
    pub events_rejected: IntCounter,
    pub batches_ingested: IntCounter,
    pub ingest_duration: Histogram,
    pub registry: Registry,
}

impl Telemetry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let events_accepted =
            IntCounter::with_opts(Opts::new("events_accepted_total", "Events persisted as new records"))
                .expect("static metric opts");
        let events_updated =
            IntCounter::with_opts(Opts::new("events_updated_total", "Events that replaced an existing record"))
                .expect("static metric opts");
        let events_deduped =
            IntCounter::with_opts(Opts::new("events_deduped_total", "Events recognized as re-deliveries"))
                .expect("static metric opts");
        let events_rejected =
            IntCounter::with_opts(Opts::new("events_rejected_total", "Events failing validation"))
                .expect("static metric opts");
        let batches_ingested =
            IntCounter::with_opts(Opts::new("batches_ingested_total", "Ingestion batches processed"))
                .expect("static metric opts");
        let ingest_duration = Histogram::with_opts(HistogramOpts::new(
            "ingest_batch_seconds",
            "Wall time spent resolving one batch",
        ))
        .expect("static metric opts");

        registry.register(Box::new(events_accepted.clone())).ok();
        registry.register(Box::new(events_updated.clone())).ok();
        registry.register(Box::new(events_deduped.clone())).ok();
        registry.register(Box::new(events_rejected.clone())).ok();
        registry.register(Box::new(batches_ingested.clone())).ok();
        registry.register(Box::new(ingest_duration.clone())).ok();

        Telemetry {
            events_accepted,
            events_updated,
            events_deduped,
            events_rejected,
            batches_ingested,
            ingest_duration,
            registry,
        }
    }

    /// Gather metrics in Prometheus text format.
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buffer).unwrap_or_default();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
