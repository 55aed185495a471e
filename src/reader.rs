use nom::{
    bytes::complete::take,
    number::complete::{le_f64, le_u8},
    IResult,
};

use crate::{errors::CprDecodeError, varint::read_varint};

/// A read cursor over an immutable input buffer.
///
/// Every read either returns the requested value and advances the cursor, or
/// fails with [`CprDecodeError::Truncated`] and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    input: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            remaining: input,
        }
    }

    /// Offset of the cursor from the start of the input.
    pub fn position(&self) -> usize {
        self.input.len() - self.remaining.len()
    }

    /// The bytes that have not been consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Whether the unread input begins with `tag`. Does not move the cursor.
    pub fn starts_with(&self, tag: &[u8]) -> bool {
        self.remaining.starts_with(tag)
    }

    fn run<T, P>(&mut self, mut parser: P) -> Result<T, CprDecodeError>
    where
        P: FnMut(&'a [u8]) -> IResult<&'a [u8], T>,
    {
        let offset = self.position();
        match parser(self.remaining) {
            Ok((remaining, value)) => {
                self.remaining = remaining;
                Ok(value)
            }
            Err(_) => Err(CprDecodeError::Truncated { offset }),
        }
    }

    /// Reads the next `n` bytes as-is.
    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8], CprDecodeError> {
        self.run(take(n))
    }

    pub fn read_varint(&mut self) -> Result<u64, CprDecodeError> {
        self.run(read_varint)
    }

    /// Reads an 8-byte little-endian IEEE-754 double.
    pub fn read_double(&mut self) -> Result<f64, CprDecodeError> {
        self.run(le_f64)
    }

    pub fn read_byte(&mut self) -> Result<u8, CprDecodeError> {
        self.run(le_u8)
    }

    /// Reads a varint length followed by that many bytes of UTF-8 text.
    pub fn read_string(&mut self) -> Result<&'a str, CprDecodeError> {
        let len = self.read_varint()?;
        let offset = self.position();
        // A length that does not even fit in memory can only be a short read.
        let len = usize::try_from(len).map_err(|_| CprDecodeError::Truncated { offset })?;
        let bytes = self.read_fixed(len)?;
        std::str::from_utf8(bytes).map_err(|_| CprDecodeError::InvalidUtf8 { offset })
    }

    /// Upper bound for pre-allocating `count` items decoded from this input.
    ///
    /// Counts come from the wire, so they are clamped by the bytes left: every
    /// item takes at least one byte.
    pub(crate) fn capacity_hint(&self, count: u64) -> usize {
        usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(self.remaining.len())
    }
}
