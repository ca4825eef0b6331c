//! Quote- and parenthesis-aware scanning primitives.
//!
//! Every extraction step walks statement text through [`Scanner`], so quote
//! and nesting state is tracked the same way everywhere. Escapes inside
//! quotes are not interpreted: a quote character always toggles.

/// A single scanned byte together with the state it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPos {
    pub index: usize,
    pub byte: u8,
    /// Outside any quote, at parenthesis depth zero, and not itself a quote or
    /// parenthesis.
    pub top_level: bool,
}

pub struct Scanner<'a> {
    source: &'a str,
    current: usize,
    depth: usize,
    quote: Option<u8>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, 0)
    }

    /// Starts scanning at `from`, assuming that position is at top level.
    pub fn starting_at(source: &'a str, from: usize) -> Self {
        Self {
            source,
            current: from.min(source.len()),
            depth: 0,
            quote: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn in_quote(&self) -> bool {
        self.quote.is_some()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> Option<ScanPos> {
        if self.is_at_end() {
            return None;
        }
        let index = self.current;
        let byte = self.source.as_bytes()[index];
        self.current += 1;

        let top_level = match (self.quote, byte) {
            (Some(open), b) if b == open => {
                self.quote = None;
                false
            }
            (Some(_), _) => false,
            (None, b'\'' | b'"') => {
                self.quote = Some(byte);
                false
            }
            (None, b'(') => {
                self.depth += 1;
                false
            }
            (None, b')') => {
                self.depth = self.depth.saturating_sub(1);
                false
            }
            (None, _) => self.depth == 0,
        };

        Some(ScanPos {
            index,
            byte,
            top_level,
        })
    }

    /// Finds the next top-level occurrence of `keyword` delimited by non-word
    /// characters (or the text boundaries).
    pub fn find_keyword(&mut self, keyword: &str) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let kw = keyword.as_bytes();
        if kw.is_empty() {
            return None;
        }
        while let Some(pos) = self.advance() {
            if !pos.top_level || !bytes[pos.index..].starts_with(kw) {
                continue;
            }
            let before_ok = pos.index == 0 || !is_word_byte(bytes[pos.index - 1]);
            let after = pos.index + kw.len();
            let after_ok = after >= bytes.len() || !is_word_byte(bytes[after]);
            if before_ok && after_ok {
                return Some(pos.index);
            }
        }
        None
    }

    /// Splits the remaining text at top-level `delimiter` bytes. Fragments are
    /// trimmed; an empty trailing fragment is dropped.
    pub fn split(&mut self, delimiter: u8) -> Vec<&'a str> {
        let mut parts = vec![];
        let mut start = self.current;
        while let Some(pos) = self.advance() {
            if pos.top_level && pos.byte == delimiter {
                parts.push(self.source[start..pos.index].trim());
                start = pos.index + 1;
            }
        }
        let last = self.source[start..].trim();
        if !last.is_empty() {
            parts.push(last);
        }
        parts
    }

    /// Given the index of an opening parenthesis, returns the index of the
    /// parenthesis that closes it.
    pub fn matching_paren(&mut self) -> Option<usize> {
        let open_depth = self.depth;
        let first = self.advance()?;
        if first.byte != b'(' || self.in_quote() {
            return None;
        }
        while let Some(pos) = self.advance() {
            if pos.byte == b')' && !self.in_quote() && self.depth == open_depth {
                return Some(pos.index);
            }
        }
        None
    }
}

impl Iterator for Scanner<'_> {
    type Item = ScanPos;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

pub(crate) fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || !byte.is_ascii()
}

/// Index of the top-level `keyword` at or after `from`, if any.
pub fn find_top_level(text: &str, keyword: &str, from: usize) -> Option<usize> {
    Scanner::starting_at(text, from).find_keyword(keyword)
}

/// Splits `text` at top-level occurrences of `delimiter`.
pub fn split_top_level(text: &str, delimiter: char) -> Vec<&str> {
    if !delimiter.is_ascii() {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            vec![]
        } else {
            vec![trimmed]
        };
    }
    Scanner::new(text).split(delimiter as u8)
}

/// Splits a script into statements at top-level `;`, dropping empty ones.
pub fn split_statements(text: &str) -> Vec<&str> {
    Scanner::new(text)
        .split(b';')
        .into_iter()
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

/// Index of the parenthesis closing the one at `open`.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    Scanner::starting_at(text, open).matching_paren()
}

/// Replaces the content of quoted literals with spaces, keeping byte offsets.
pub fn mask_quoted(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut scanner = Scanner::new(text);
    while let Some(pos) = scanner.next() {
        let inside = scanner.in_quote() && !matches!(pos.byte, b'\'' | b'"');
        if pos.byte.is_ascii() {
            masked.push(if inside { ' ' } else { pos.byte as char });
        } else {
            // one space per byte keeps offsets aligned
            masked.push(' ');
        }
    }
    masked
}

/// Removes `--` line comments and `/* */` block comments outside quotes.
pub fn strip_comments(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<u8> = None;
    let mut copied_up_to = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(open) = quote {
            if b == open {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                out.push_str(&sql[copied_up_to..i]);
                let end = sql[i..].find('\n').map_or(bytes.len(), |off| i + off);
                out.push(' ');
                i = end;
                copied_up_to = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&sql[copied_up_to..i]);
                let end = sql[i + 2..].find("*/").map_or(bytes.len(), |off| i + 2 + off + 2);
                out.push(' ');
                i = end;
                copied_up_to = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[copied_up_to..]);
    out
}
