//! Character reader over source text.
//!
//! Comments (`/* */` and `//`) are invisible to every scan except inside
//! string literals. Scans that look for a delimiter are nesting-aware:
//! quotes, parentheses, brackets, and braces are balanced, so a `;` inside
//! `url(...)` or a quoted string never terminates a scan early.

/// Byte classification for identifiers: `[A-Za-z0-9_-]`.
#[inline]
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

#[inline]
fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

pub struct Reader<'src> {
    source: &'src str,
    pos: usize,
    /// Added to positions so spans of sub-readers stay file-absolute.
    base: u32,
}

impl<'src> Reader<'src> {
    pub fn new(source: &'src str) -> Reader<'src> {
        Reader {
            source,
            pos: 0,
            base: 0,
        }
    }

    /// A reader over a substring whose first byte sits at file offset
    /// `base`.
    pub fn with_base(source: &'src str, base: u32) -> Reader<'src> {
        Reader {
            source,
            pos: 0,
            base,
        }
    }

    fn bytes(&self) -> &'src [u8] {
        self.source.as_bytes()
    }

    /// File-absolute offset of the next unread byte.
    pub fn offset(&self) -> u32 {
        self.base + self.pos as u32
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes().get(self.pos + ahead).copied()
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skip whitespace and comments. Returns true if anything was skipped.
    pub fn skip_trivia(&mut self) -> bool {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b) if is_space(b) => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.pos < self.source.len() {
                        if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        self.pos > start
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.source.len()
    }

    /// Consume `byte` if it is next after trivia.
    pub fn eat(&mut self, byte: u8) -> bool {
        self.skip_trivia();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume an identifier run. Empty when the next byte is not an
    /// identifier byte.
    pub fn read_ident(&mut self) -> &'src str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_ident_byte(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Scan forward to the first of `stops` at nesting depth zero, outside
    /// quotes and comments. Returns the raw text before the stop (comments
    /// included, callers re-scan it) and the stop byte, consuming both.
    /// `None` when the input ends first.
    pub fn scan_until(&mut self, stops: &[u8]) -> Option<(&'src str, u8)> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        while let Some(b) = self.peek() {
            if let Some(q) = quote {
                if b == b'\\' {
                    self.pos += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                self.pos += 1;
                continue;
            }
            match b {
                b'\'' | b'"' => {
                    quote = Some(b);
                    self.pos += 1;
                }
                b'/' if self.peek_at(1) == Some(b'*') || self.peek_at(1) == Some(b'/') => {
                    self.skip_trivia();
                }
                b'(' | b'[' | b'{' => {
                    if depth == 0 && stops.contains(&b) {
                        let text = &self.source[start..self.pos];
                        self.pos += 1;
                        return Some((text, b));
                    }
                    depth += 1;
                    self.pos += 1;
                }
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        if stops.contains(&b) {
                            let text = &self.source[start..self.pos];
                            self.pos += 1;
                            return Some((text, b));
                        }
                        // Unbalanced closer; let the caller report it.
                        return None;
                    }
                    depth -= 1;
                    self.pos += 1;
                }
                _ => {
                    if depth == 0 && stops.contains(&b) {
                        let text = &self.source[start..self.pos];
                        self.pos += 1;
                        return Some((text, b));
                    }
                    self.pos += 1;
                }
            }
        }
        None
    }

    /// Like [`Reader::scan_until`] but for text inside an already-opened
    /// `(`: returns the text up to the matching `)`, consuming it.
    pub fn scan_parenthesized(&mut self) -> Option<&'src str> {
        self.scan_until(&[b')']).map(|(text, _)| text)
    }

    /// True when the upcoming bytes, after trivia, spell `keyword`
    /// case-insensitively with a non-identifier byte after it. Does not
    /// consume.
    pub fn peek_keyword_ci(&mut self, keyword: &str) -> bool {
        self.skip_trivia();
        let bytes = self.bytes();
        let end = self.pos + keyword.len();
        if end > bytes.len() {
            return false;
        }
        if !bytes[self.pos..end].eq_ignore_ascii_case(keyword.as_bytes()) {
            return false;
        }
        match bytes.get(end) {
            Some(&b) => !is_ident_byte(b),
            None => true,
        }
    }

    /// Inner text of a string literal whose opening quote was already
    /// consumed. Consumes through the closing quote; `None` when the input
    /// ends first. Backslash escapes the next byte.
    pub fn read_quoted(&mut self, quote: u8) -> Option<&'src str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\\' {
                self.pos = (self.pos + 2).min(self.source.len());
                continue;
            }
            if b == quote {
                let text = &self.source[start..self.pos];
                self.pos += 1;
                return Some(text);
            }
            self.pos += 1;
        }
        None
    }

    /// Remaining unread text.
    pub fn rest(&self) -> &'src str {
        &self.source[self.pos.min(self.source.len())..]
    }
}
