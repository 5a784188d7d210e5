//! Little helpers for decoding the ledger's fixed-layout wire structures.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("short buffer: need {need} more bytes at offset {at}")]
    Short { at: usize, need: usize },

    #[error("{0} trailing bytes after decode")]
    Trailing(usize),

    #[error("malformed data: {0}")]
    Invalid(String),
}

/// Cursor over a byte slice. All multi-byte reads are little-endian, matching
/// the ledger's canonical binary forms.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Short {
                at: self.pos,
                need: n - self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16, WireError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32_le(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64_le(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn i64_le(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    /// Succeeds only if every byte has been consumed.
    pub fn finish(self) -> Result<(), WireError> {
        if self.remaining() > 0 {
            return Err(WireError::Trailing(self.remaining()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_order() {
        let data = [1u8, 0, 2, 0, 0, 0, 7];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u16_le().unwrap(), 1);
        assert_eq!(r.u32_le().unwrap(), 2);
        assert_eq!(r.u8().unwrap(), 7);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn short_read_reports_position() {
        let mut r = ByteReader::new(&[0u8; 3]);
        assert_eq!(
            r.u64_le().unwrap_err(),
            WireError::Short { at: 0, need: 5 }
        );
    }

    #[test]
    fn finish_rejects_trailing() {
        let r = ByteReader::new(&[0u8; 2]);
        assert_eq!(r.finish().unwrap_err(), WireError::Trailing(2));
    }
}
