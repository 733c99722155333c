//! Pool-related errors

use crowdsync_core::id::IdentityHash;

pub type Result<T> = core::result::Result<T, PoolError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is bound; the update should be dropped or queued by the caller
    #[error("entity pool exhausted ({capacity} slots in use)")]
    Exhausted { capacity: usize },
    /// The identifier hashes to the same wire key as another active identifier
    #[error("identity hash {hash:#010x} is already bound to {existing:?}")]
    HashCollision { hash: IdentityHash, existing: String },
}
