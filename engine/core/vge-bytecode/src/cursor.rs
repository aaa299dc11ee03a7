use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("read past end of segment at {offset:#06x}")]
    EndOfSegment { offset: usize },
    #[error("undefined instruction {opcode:#04x} at {offset:#06x}")]
    UndefinedInstruction { offset: usize, opcode: u8 },
}

/// Sequential big-endian reader over an immutable segment.
///
/// Segments are at most 64KiB so positions fit in a `u16` when stored back
/// into the task table.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8], pos: u16) -> Self {
        Self { bytes, pos: pos as usize }
    }

    #[inline(always)]
    pub fn pos(&self) -> u16 {
        self.pos as u16
    }

    #[inline(always)]
    pub fn seek(&mut self, pos: u16) {
        self.pos = pos as usize;
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline(always)]
    pub fn fetch_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(DecodeError::EndOfSegment { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline(always)]
    pub fn fetch_word(&mut self) -> Result<u16, DecodeError> {
        let hi = self.fetch_byte()?;
        let lo = self.fetch_byte()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Byte at the current position without advancing.
    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_big_endian() {
        let data = [0x12, 0x34, 0xFF];
        let mut cursor = ByteCursor::new(&data, 0);
        assert_eq!(cursor.fetch_word(), Ok(0x1234));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.fetch_byte(), Ok(0xFF));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn reading_past_the_end_reports_offset() {
        let data = [0x01];
        let mut cursor = ByteCursor::new(&data, 0);
        assert_eq!(cursor.fetch_word(), Err(DecodeError::EndOfSegment { offset: 1 }));
    }

    #[test]
    fn seek_moves_without_reading() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut cursor = ByteCursor::new(&data, 0);
        cursor.seek(2);
        assert_eq!(cursor.peek_byte(), Some(0xCC));
        assert_eq!(cursor.fetch_byte(), Ok(0xCC));
    }
}
