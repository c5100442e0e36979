use alloc::string::String;
use core::fmt;

pub const MAX_STRING_SIZE: usize = 0x1000;

/// `core::fmt::Write` sink over a fixed buffer. Output past the capacity
/// is dropped at a UTF-8 boundary; one byte is kept for a trailing NUL.
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> BoundedWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        if let Some(first) = buf.first_mut() {
            *first = 0;
        }
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    fn limit(&self) -> usize {
        self.buf.len().min(MAX_STRING_SIZE).saturating_sub(1)
    }

    pub fn as_str(&self) -> &str {
        // Only whole UTF-8 sequences are ever copied in.
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        let room = self.limit() - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            self.truncated = true;
        }
        if self.len < self.buf.len() {
            self.buf[self.len] = 0;
        }
        Ok(())
    }
}

/// Formats into an owned string that would fit a `capacity`-byte C buffer.
pub fn bounded_format(capacity: usize, args: fmt::Arguments<'_>) -> String {
    let capacity = capacity.min(MAX_STRING_SIZE);
    let mut s = String::new();
    let mut sink = Truncating {
        out: &mut s,
        room: capacity.saturating_sub(1),
    };
    let _ = fmt::write(&mut sink, args);
    s
}

struct Truncating<'a> {
    out: &'a mut String,
    room: usize,
}

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut take = s.len().min(self.room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.out.push_str(&s[..take]);
        self.room -= take;
        Ok(())
    }
}

fn c_len(s: &[u8]) -> usize {
    let bound = s.len().min(MAX_STRING_SIZE);
    s[..bound].iter().position(|&b| b == 0).unwrap_or(bound)
}

/// Copies the NUL-terminated prefix of `src` into `dest` and terminates it.
/// Returns the number of bytes copied, excluding the terminator.
pub fn copy_bounded(dest: &mut [u8], src: &[u8]) -> usize {
    let room = dest.len().min(MAX_STRING_SIZE);
    if room == 0 {
        return 0;
    }
    let n = c_len(src).min(room - 1);
    dest[..n].copy_from_slice(&src[..n]);
    dest[n] = 0;
    n
}

/// Appends the NUL-terminated prefix of `src` to the string already in
/// `dest`. Returns the new length.
pub fn concat_bounded(dest: &mut [u8], src: &[u8]) -> usize {
    let start = c_len(dest);
    let room = dest.len().min(MAX_STRING_SIZE);
    if start >= room {
        return start;
    }
    start + copy_bounded(&mut dest[start..room], src)
}

/// Index of `ch` within the NUL-terminated prefix of `s`.
pub fn find_byte(s: &[u8], ch: u8) -> Option<usize> {
    s[..c_len(s)].iter().position(|&b| b == ch)
}

/// Decodes a NUL-terminated UCS-2 buffer.
pub fn decode_ucs2(units: &[u16]) -> String {
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    char::decode_utf16(units[..end].iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
