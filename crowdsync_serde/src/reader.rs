use crate::SerializationError;
use bytes::Buf;

/// Read-only cursor over a received buffer.
///
/// Borrows the buffer, so decoding a packet never copies it.
#[derive(Debug, Clone)]
pub struct Reader<'a>(&'a [u8]);

impl<'a> From<&'a [u8]> for Reader<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self(value)
    }
}

impl<'a> Reader<'a> {
    /// Number of bytes that have not been read yet
    pub fn remaining(&self) -> usize {
        self.0.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.0.has_remaining()
    }

    /// Checks that at least `needed` bytes are left, so that the `Buf` getters never panic
    pub fn ensure(&self, needed: usize) -> Result<(), SerializationError> {
        let remaining = self.0.remaining();
        if remaining < needed {
            return Err(SerializationError::BufferTooShort { needed, remaining });
        }
        Ok(())
    }
}

/// Little-endian fixed-width reads
pub trait ReadInteger {
    fn read_u8(&mut self) -> Result<u8, SerializationError>;
    fn read_u16(&mut self) -> Result<u16, SerializationError>;
    fn read_i16(&mut self) -> Result<i16, SerializationError>;
    fn read_u32(&mut self) -> Result<u32, SerializationError>;
    fn read_f32(&mut self) -> Result<f32, SerializationError>;
}

impl ReadInteger for Reader<'_> {
    fn read_u8(&mut self) -> Result<u8, SerializationError> {
        self.ensure(1)?;
        Ok(self.0.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16, SerializationError> {
        self.ensure(2)?;
        Ok(self.0.get_u16_le())
    }

    fn read_i16(&mut self) -> Result<i16, SerializationError> {
        self.ensure(2)?;
        Ok(self.0.get_i16_le())
    }

    fn read_u32(&mut self) -> Result<u32, SerializationError> {
        self.ensure(4)?;
        Ok(self.0.get_u32_le())
    }

    fn read_f32(&mut self) -> Result<f32, SerializationError> {
        self.ensure(4)?;
        Ok(self.0.get_f32_le())
    }
}
