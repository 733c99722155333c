use crate::SerializationError;
use bytes::{BufMut, Bytes, BytesMut};

/// Growable output buffer
#[derive(Debug, Default)]
pub struct Writer(BytesMut);

impl Writer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(BytesMut::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Take the bytes written so far, leaving the writer empty with its spare capacity
    pub fn split(&mut self) -> Bytes {
        self.0.split().freeze()
    }

    /// Consume the writer to get the written bytes
    pub fn to_bytes(self) -> Bytes {
        self.0.freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Little-endian fixed-width writes
pub trait WriteInteger {
    fn write_u8(&mut self, value: u8) -> Result<(), SerializationError>;
    fn write_u16(&mut self, value: u16) -> Result<(), SerializationError>;
    fn write_i16(&mut self, value: i16) -> Result<(), SerializationError>;
    fn write_u32(&mut self, value: u32) -> Result<(), SerializationError>;
    fn write_f32(&mut self, value: f32) -> Result<(), SerializationError>;
}

impl WriteInteger for Writer {
    fn write_u8(&mut self, value: u8) -> Result<(), SerializationError> {
        self.0.put_u8(value);
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> Result<(), SerializationError> {
        self.0.put_u16_le(value);
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<(), SerializationError> {
        self.0.put_i16_le(value);
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), SerializationError> {
        self.0.put_u32_le(value);
        Ok(())
    }

    fn write_f32(&mut self, value: f32) -> Result<(), SerializationError> {
        self.0.put_f32_le(value);
        Ok(())
    }
}

/// Writes into a fixed-size stack buffer, used for single records
pub struct SliceWriter<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), SerializationError> {
        let remaining = self.buffer.len() - self.position;
        if remaining < bytes.len() {
            return Err(SerializationError::BufferTooShort {
                needed: bytes.len(),
                remaining,
            });
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }
}

impl WriteInteger for SliceWriter<'_> {
    fn write_u8(&mut self, value: u8) -> Result<(), SerializationError> {
        self.put(&[value])
    }

    fn write_u16(&mut self, value: u16) -> Result<(), SerializationError> {
        self.put(&value.to_le_bytes())
    }

    fn write_i16(&mut self, value: i16) -> Result<(), SerializationError> {
        self.put(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), SerializationError> {
        self.put(&value.to_le_bytes())
    }

    fn write_f32(&mut self, value: f32) -> Result<(), SerializationError> {
        self.put(&value.to_le_bytes())
    }
}
