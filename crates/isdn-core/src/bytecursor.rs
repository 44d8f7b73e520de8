use crate::PduParseErr;

/// Read cursor over a borrowed byte slice. Every read is bounds-checked against
/// the end of the slice and fails with `PduParseErr::BufferEnded` instead of panicking.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn get_pos(&self) -> usize {
        self.pos
    }

    pub fn get_len_remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, PduParseErr> {
        match self.buf.get(self.pos) {
            Some(b) => {
                self.pos += 1;
                Ok(*b)
            }
            None => Err(PduParseErr::BufferEnded { field: Some(field) }),
        }
    }

    /// Returns the next `len` bytes and advances past them
    pub fn read_slice(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], PduParseErr> {
        let end = self.pos.checked_add(len).ok_or(PduParseErr::BufferEnded { field: Some(field) })?;
        if end > self.buf.len() {
            return Err(PduParseErr::InconsistentLength {
                expected: len,
                found: self.buf.len() - self.pos,
            });
        }
        let s = &self.buf[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    pub fn skip(&mut self, len: usize, field: &'static str) -> Result<(), PduParseErr> {
        self.read_slice(len, field).map(|_| ())
    }

    /// Everything not yet consumed
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos.min(self.buf.len())..]
    }
}

/// Copies at most `capacity - 1` bytes of `src` into a new string, mirroring a
/// NUL-terminated destination buffer of `capacity` bytes. Non-ASCII bytes are kept as Latin-1.
pub fn clamped_text(src: &[u8], capacity: usize) -> String {
    let max = capacity.saturating_sub(1);
    src.iter().take(max).map(|&b| b as char).collect()
}

/// Truncates a string to at most `max` characters
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
