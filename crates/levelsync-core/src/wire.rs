//! Little-endian byte codec
//!
//! `Wire` is the serialization contract for every value that crosses the
//! network. Types are fixed-size; `Wire::SIZE` is the exact encoded length.

use crate::{Error, Result};

/// A value with a fixed-size little-endian wire encoding
pub trait Wire: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Append the encoded value to the writer
    fn ser(&self, writer: &mut WireWriter);

    /// Decode a value, advancing the reader
    fn de(reader: &mut WireReader<'_>) -> Result<Self>;
}

/// Growable output buffer
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a writer with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// View the written bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return its buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Cursor over a borrowed input buffer
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// Read exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let remaining = self.remaining();
        if remaining < N {
            return Err(Error::UnexpectedEof {
                needed: N,
                remaining,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.cursor..self.cursor + N]);
        self.cursor += N;
        Ok(out)
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    /// Check if every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail if any bytes are left unread
    pub fn expect_end(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }
}

macro_rules! impl_wire_le {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Wire for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn ser(&self, writer: &mut WireWriter) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut WireReader<'_>) -> Result<Self> {
                    Ok(<$ty>::from_le_bytes(reader.read_array()?))
                }
            }
        )+
    };
}

impl_wire_le!(u8, u16, u32, u64, u128, i8, i16, i32, i64, f32, f64);

impl Wire for bool {
    const SIZE: usize = 1;

    fn ser(&self, writer: &mut WireWriter) {
        writer.write_bytes(&[*self as u8]);
    }

    fn de(reader: &mut WireReader<'_>) -> Result<Self> {
        match u8::de(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidValue {
                field: "bool",
                value: other as u64,
            }),
        }
    }
}
