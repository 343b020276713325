use crate::domain::event::{EventRecord, NormalizedEvent};
use crate::domain::outcome::IngestCounts;
use crate::store::{EventStore, StoreError};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Reconciles a deduplicated candidate set against persisted state and writes
/// the winning versions. Both implementations share one classification
/// predicate:
///
/// - no existing record: `accepted`, insert;
/// - existing record with equal business fields: `deduped`, no write,
///   regardless of which delivery is newer;
/// - existing record, candidate strictly newer by `received_time`, content
///   differs: `updated`, overwrite;
/// - existing record, candidate not newer, content differs: dropped without
///   a counter.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(&self, candidates: Vec<NormalizedEvent>) -> Result<IngestCounts, StoreError>;
}

/// Lock-then-compare strategy: one write transaction locks the batch's rows,
/// classification happens in application memory against the locked snapshot,
/// then inserts and updates are applied as two grouped writes. Batches that
/// share identifiers serialize on the transaction; reads issued by a blocked
/// batch observe the winner's commit.
pub struct LockingResolver {
    store: EventStore,
}

impl LockingResolver {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConflictResolver for LockingResolver {
    async fn resolve(&self, candidates: Vec<NormalizedEvent>) -> Result<IngestCounts, StoreError> {
        let mut txn = self.store.begin_write().await;
        let existing = txn.select_for_update(candidates.iter().map(|c| c.event_id.as_str()));

        let mut counts = IngestCounts::default();
        let mut to_insert = Vec::new();
        let mut to_update = Vec::new();

        for candidate in candidates {
            match existing.get(&candidate.event_id) {
                None => {
                    counts.accepted += 1;
                    to_insert.push(candidate);
                }
                Some(row) => {
                    if row.is_identical(&candidate) {
                        counts.deduped += 1;
                    } else if row.received_time < candidate.received_time {
                        counts.updated += 1;
                        to_update.push(candidate);
                    }
                }
            }
        }

        for candidate in to_insert {
            txn.insert(EventRecord::new(candidate));
        }
        for candidate in &to_update {
            txn.apply_update(candidate)?;
        }

        Ok(counts)
    }
}

/// Set-based strategy: the whole candidate set goes to the store's
/// conditional merge, which classifies and writes every row in a single
/// atomic pass and reports the counts from that same pass. No explicit row
/// locks; a race between two batches on one identifier is settled by the
/// merge's newer-wins predicate, so the loser's count may read `deduped`
/// even though it lost a real race, but the persisted row is never corrupted.
pub struct UpsertResolver {
    store: EventStore,
}

impl UpsertResolver {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConflictResolver for UpsertResolver {
    async fn resolve(&self, candidates: Vec<NormalizedEvent>) -> Result<IngestCounts, StoreError> {
        self.store.merge_batch(candidates).await
    }
}

#[derive(Error, Debug)]
#[error("unknown conflict strategy: {0} (expected \"locking\" or \"upsert\")")]
pub struct UnknownStrategy(String);

/// Which resolver implementation serves ingestion. Selected by configuration
/// at startup; `Upsert` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverStrategy {
    Locking,
    #[default]
    Upsert,
}

impl ResolverStrategy {
    pub fn build(self, store: EventStore) -> Arc<dyn ConflictResolver> {
        match self {
            ResolverStrategy::Locking => Arc::new(LockingResolver::new(store)),
            ResolverStrategy::Upsert => Arc::new(UpsertResolver::new(store)),
        }
    }
}

impl FromStr for ResolverStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locking" => Ok(ResolverStrategy::Locking),
            "upsert" => Ok(ResolverStrategy::Upsert),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}
