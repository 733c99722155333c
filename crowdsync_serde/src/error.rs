#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationError {
    #[error("buffer too short: needed {needed} bytes but only {remaining} remain")]
    BufferTooShort { needed: usize, remaining: usize },
    #[error("batch of {0} records does not fit in a u16 count header")]
    BatchTooLarge(usize),
    #[error("{0} unread bytes left after decoding")]
    TrailingBytes(usize),
}
