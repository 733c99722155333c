//! Wire format for remote entity state
//!
//! A single record is 18 bytes, little-endian:
//!
//! | offset | size | field           | encoding                               |
//! |--------|------|-----------------|----------------------------------------|
//! | 0      | 4    | identity hash   | `u32`                                  |
//! | 4      | 4    | x               | `f32`                                  |
//! | 8      | 2    | y               | `i16`, metres * 100, rounded, clamped  |
//! | 10     | 4    | z               | `f32`                                  |
//! | 14     | 2    | rotation        | `i16`, radians * 1000, rounded, clamped|
//! | 16     | 1    | flags           | [`StateFlags`]                         |
//! | 17     | 1    | timestamp delta | `u8`, ms since previous sync, max 255  |
//!
//! Height and rotation are quantized on purpose: height keeps centimetre precision over
//! +-327 m and rotation keeps ~0.001 rad over +-32.7 rad, which is plenty for avatars and
//! saves 4 bytes per record.
//!
//! A batch is a `u16` record count followed by that many records.
use crate::flags::StateFlags;
use crate::id::IdentityHash;
use bevy_math::Vec3;
use bytes::Bytes;
use core::time::Duration;
use crowdsync_serde::{
    ReadInteger, Reader, SerializationError, SliceWriter, ToBytes, WriteInteger, Writer,
};
use tracing::trace;

/// Size in bytes of one encoded [`StateUpdate`]
pub const RECORD_LEN: usize = 18;

/// Size in bytes of the record count that prefixes a batch
pub const BATCH_HEADER_LEN: usize = 2;

const HEIGHT_SCALE: f32 = 100.0;
const ROTATION_SCALE: f32 = 1000.0;

/// State of one remote participant, as carried by the wire
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StateUpdate {
    pub hash: IdentityHash,
    pub position: Vec3,
    /// Heading around the vertical axis, in radians
    pub rotation: f32,
    pub flags: StateFlags,
    /// Milliseconds since the previous update from the same sender, 0 if unknown
    pub timestamp_delta_ms: u8,
}

impl StateUpdate {
    pub fn new(hash: IdentityHash, position: Vec3, rotation: f32) -> Self {
        Self {
            hash,
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: StateFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the time since the previous update, saturating at 255ms
    pub fn with_timestamp_delta(mut self, delta: Duration) -> Self {
        self.timestamp_delta_ms = delta.as_millis().min(u8::MAX as u128) as u8;
        self
    }

    /// Time since the previous update from the same sender, if the sender filled it in
    pub fn timestamp_delta(&self) -> Option<Duration> {
        (self.timestamp_delta_ms != 0)
            .then(|| Duration::from_millis(self.timestamp_delta_ms as u64))
    }

    /// Encode into a fixed-size record
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buffer = [0u8; RECORD_LEN];
        let result = self.to_bytes(&mut SliceWriter::new(&mut buffer));
        debug_assert!(result.is_ok(), "a record always fits in RECORD_LEN bytes");
        buffer
    }

    /// Decode exactly one record
    pub fn decode(buffer: &[u8]) -> Result<Self, SerializationError> {
        let mut reader = Reader::from(buffer);
        let update = Self::from_bytes(&mut reader)?;
        if reader.has_remaining() {
            return Err(SerializationError::TrailingBytes(reader.remaining()));
        }
        Ok(update)
    }
}

fn quantize(value: f32, scale: f32) -> i16 {
    // `as` saturates, and maps NaN to 0
    (value * scale).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn dequantize(value: i16, scale: f32) -> f32 {
    value as f32 / scale
}

impl ToBytes for StateUpdate {
    fn bytes_len(&self) -> usize {
        RECORD_LEN
    }

    fn to_bytes(&self, buffer: &mut impl WriteInteger) -> Result<(), SerializationError> {
        buffer.write_u32(self.hash)?;
        buffer.write_f32(self.position.x)?;
        buffer.write_i16(quantize(self.position.y, HEIGHT_SCALE))?;
        buffer.write_f32(self.position.z)?;
        buffer.write_i16(quantize(self.rotation, ROTATION_SCALE))?;
        buffer.write_u8(self.flags.bits())?;
        buffer.write_u8(self.timestamp_delta_ms)?;
        Ok(())
    }

    fn from_bytes(buffer: &mut Reader<'_>) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        // check up front so that a truncated record fails before anything is consumed
        buffer.ensure(RECORD_LEN)?;
        let hash = buffer.read_u32()?;
        let x = buffer.read_f32()?;
        let y = dequantize(buffer.read_i16()?, HEIGHT_SCALE);
        let z = buffer.read_f32()?;
        let rotation = dequantize(buffer.read_i16()?, ROTATION_SCALE);
        // unknown bits are dropped rather than rejected, so newer senders can add flags
        let flags = StateFlags::from_bits_truncate(buffer.read_u8()?);
        let timestamp_delta_ms = buffer.read_u8()?;
        Ok(Self {
            hash,
            position: Vec3::new(x, y, z),
            rotation,
            flags,
            timestamp_delta_ms,
        })
    }
}

/// Write a count header followed by every record into `writer`
pub fn encode_batch_into(
    updates: &[StateUpdate],
    writer: &mut Writer,
) -> Result<(), SerializationError> {
    let count = u16::try_from(updates.len())
        .map_err(|_| SerializationError::BatchTooLarge(updates.len()))?;
    writer.write_u16(count)?;
    for update in updates {
        update.to_bytes(writer)?;
    }
    Ok(())
}

/// Encode a batch: a `u16` count followed by the concatenated records
pub fn encode_batch(updates: &[StateUpdate]) -> Result<Bytes, SerializationError> {
    let mut writer = Writer::with_capacity(BATCH_HEADER_LEN + updates.len() * RECORD_LEN);
    encode_batch_into(updates, &mut writer)?;
    Ok(writer.to_bytes())
}

/// Decode a batch into `out`, reusing its allocation.
///
/// `out` is cleared first. On error `out` is left empty: a batch is accepted or rejected as a
/// whole.
pub fn decode_batch_into(
    buffer: &[u8],
    out: &mut Vec<StateUpdate>,
) -> Result<(), SerializationError> {
    out.clear();
    let mut reader = Reader::from(buffer);
    let count = reader.read_u16()? as usize;
    // never trust the declared count: check it against what actually arrived
    reader.ensure(count * RECORD_LEN)?;
    if reader.remaining() > count * RECORD_LEN {
        return Err(SerializationError::TrailingBytes(
            reader.remaining() - count * RECORD_LEN,
        ));
    }
    out.reserve(count);
    for _ in 0..count {
        out.push(StateUpdate::from_bytes(&mut reader)?);
    }
    trace!(count, "decoded state batch");
    Ok(())
}

/// Decode a batch produced by [`encode_batch`]
pub fn decode_batch(buffer: &[u8]) -> Result<Vec<StateUpdate>, SerializationError> {
    let mut out = Vec::new();
    decode_batch_into(buffer, &mut out)?;
    Ok(out)
}
