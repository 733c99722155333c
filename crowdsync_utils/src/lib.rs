//! Contains a set of useful utilities

pub mod collections;

#[cfg(feature = "metrics")]
pub mod metrics;
