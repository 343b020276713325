use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
