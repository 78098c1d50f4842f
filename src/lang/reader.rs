use super::token::{self, O_REM, REM};

/// Cursor over a tokenised byte stream or over plain program text.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Reader<'a> {
        Reader {
            buf,
            pos: pos.min(buf.len()),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }

    pub fn back(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Byte `n` positions ahead of the cursor.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.buf.get(self.pos + n).copied()
    }

    /// Up to `n` bytes from the cursor without advancing.
    pub fn peek_n(&self, n: usize) -> &'a [u8] {
        let end = (self.pos + n).min(self.buf.len());
        &self.buf[self.pos..end]
    }

    pub fn read(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub fn read_n(&mut self, n: usize) -> &'a [u8] {
        let s = self.peek_n(n);
        self.pos += s.len();
        s
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        let s = self.read_n(2);
        if s.len() == 2 {
            Some(u16::from_le_bytes([s[0], s[1]]))
        } else {
            None
        }
    }

    /// Advance over bytes in `set` and return the next byte.
    pub fn skip(&mut self, set: &[u8]) -> Option<u8> {
        while let Some(c) = self.peek() {
            if !set.contains(&c) {
                return Some(c);
            }
            self.pos += 1;
        }
        None
    }

    pub fn skip_white(&mut self) -> Option<u8> {
        self.skip(token::WHITESPACE)
    }

    /// Read up to, not including, the first byte in `stops`.
    pub fn read_to(&mut self, stops: &[u8]) -> &'a [u8] {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        &self.buf[start..self.pos]
    }

    /// Reads the four byte header that follows the `\0` of a line.
    /// A zero next-line address marks the end of the program; nothing is
    /// consumed then.
    pub fn parse_line_number(&mut self) -> Option<u16> {
        let header = self.peek_n(4);
        if header.len() < 2 || (header[0] == 0 && header[1] == 0) {
            return None;
        }
        if header.len() < 4 {
            self.pos += header.len();
            return None;
        }
        self.pos += 4;
        Some(u16::from_le_bytes([header[2], header[3]]))
    }

    /// Advance to the next byte in `stops` outside of string literals,
    /// comments and number payloads. Line breaks are crossed unless `\0`
    /// is one of the stops. The stop byte is not consumed.
    pub fn skip_to(&mut self, stops: &[u8]) -> Option<u8> {
        let mut literal = false;
        loop {
            let c = self.peek()?;
            if c == 0 {
                if stops.contains(&0) {
                    return Some(0);
                }
                self.pos += 1;
                self.parse_line_number()?;
                literal = false;
                continue;
            }
            if literal {
                if c == b'"' {
                    literal = false;
                }
                self.pos += 1;
                continue;
            }
            if stops.contains(&c) {
                return Some(c);
            }
            if c == b'"' {
                literal = true;
                self.pos += 1;
            } else if c == REM || c == O_REM {
                self.pos += 1;
                self.read_to(&[0]);
            } else if let Some(n) = token::number_payload(c) {
                self.pos = (self.pos + 1 + n).min(self.buf.len());
            } else if token::is_twobyte_prefix(c) {
                self.pos = (self.pos + 2).min(self.buf.len());
            } else {
                self.pos += 1;
            }
        }
    }

    pub fn skip_to_read(&mut self, stops: &[u8]) -> Option<u8> {
        self.skip_to(stops)?;
        self.read()
    }
}
