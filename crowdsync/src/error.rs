//! Errors of the [`SyncEngine`](crate::engine::SyncEngine)
use crowdsync_replication::error::PoolError;
use crowdsync_serde::SerializationError;

pub type Result<T> = core::result::Result<T, SyncError>;

/// Every error is local to one call and leaves the engine usable
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The whole buffer was rejected, nothing was applied
    #[error("could not decode state batch: {0}")]
    Decode(#[from] SerializationError),
}
