//! IO primitives for the crowdsync wire format
//!
//! Everything on the wire is little-endian and fixed width. [`Reader`] and [`Writer`] are thin
//! wrappers over [`bytes`] buffers that report truncation as a [`SerializationError`] instead of
//! panicking, so that a malformed packet can be rejected without taking the tick loop down.

pub use error::SerializationError;
pub use reader::{ReadInteger, Reader};
pub use writer::{SliceWriter, WriteInteger, Writer};

mod error;
pub mod reader;
pub mod writer;

/// Types that have a fixed-layout binary representation
pub trait ToBytes {
    /// Number of bytes written by [`ToBytes::to_bytes`]
    fn bytes_len(&self) -> usize;

    fn to_bytes(&self, buffer: &mut impl WriteInteger) -> Result<(), SerializationError>;

    fn from_bytes(buffer: &mut Reader<'_>) -> Result<Self, SerializationError>
    where
        Self: Sized;
}
