//! Record framing shared by both formats.

use crate::errors::VecsError;

const WORD: usize = 4;

/// Cursor over length-prefixed little-endian records.
pub(crate) struct Records<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Records<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Length prefix of the first record, if the buffer holds one.
    pub(crate) fn leading_length(&self) -> Option<i32> {
        self.bytes.first_chunk::<WORD>().map(|word| i32::from_le_bytes(*word))
    }

    /// Whole records of `width` words the buffer can hold, or `None` when a
    /// record of that width is not addressable.
    pub(crate) fn capacity(&self, width: usize) -> Option<usize> {
        let record_len = width.checked_add(1)?.checked_mul(WORD)?;
        Some(self.bytes.len() / record_len)
    }

    /// Reads the next record's length prefix and payload words.
    pub(crate) fn next_record(&mut self, record: usize) -> Result<(i32, &'a [u8]), VecsError> {
        let length = i32::from_le_bytes(self.word(record)?);
        let words = usize::try_from(length).map_err(|_| VecsError::Truncated { record })?;
        let end = words
            .checked_mul(WORD)
            .and_then(|len| self.offset.checked_add(len))
            .filter(|&end| end <= self.bytes.len())
            .ok_or(VecsError::Truncated { record })?;
        let payload = &self.bytes[self.offset..end];
        self.offset = end;
        Ok((length, payload))
    }

    fn word(&mut self, record: usize) -> Result<[u8; WORD], VecsError> {
        let word = self.bytes[self.offset..]
            .first_chunk::<WORD>()
            .ok_or(VecsError::Truncated { record })?;
        self.offset += WORD;
        Ok(*word)
    }
}

/// Splits a payload into little-endian words.
pub(crate) fn words(payload: &[u8]) -> impl Iterator<Item = [u8; WORD]> + '_ {
    payload
        .chunks_exact(WORD)
        .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
}
