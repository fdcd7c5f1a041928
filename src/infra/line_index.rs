//! Newline index over a source snapshot.
//!
//! - Single memchr pass records every '\n' offset.
//! - Lines are 0-based, matching how spoken commands address them after
//!   the grammar layer has normalized numbers.
//! - Line ranges exclude the terminating '\n' (and a trailing '\r').
//! - Offset→line lookup is a binary search.
//!
//! Notes
//! - An empty buffer still has one (empty) line, so a cursor at offset 0
//!   always has a line to belong to.

use crate::core::range::Range;

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte positions of every '\n' in the buffer.
    newlines: Vec<usize>,
    /// Total byte length of the buffer.
    len: usize,
    /// Whether each newline is preceded by '\r'.
    crlf: Vec<bool>,
}

impl LineIndex {
    pub fn build(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut newlines = Vec::with_capacity(bytes.len() / 40);
        let mut crlf = Vec::with_capacity(bytes.len() / 40);

        for pos in memchr::memchr_iter(b'\n', bytes) {
            newlines.push(pos);
            crlf.push(pos > 0 && bytes[pos - 1] == b'\r');
        }

        Self {
            newlines,
            len: bytes.len(),
            crlf,
        }
    }

    /// Number of lines; always at least one.
    pub fn line_count(&self) -> usize {
        self.newlines.len() + 1
    }

    /// Offset of the first byte of a 0-based line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        match line {
            0 => Some(0),
            n => self.newlines.get(n - 1).map(|&nl| nl + 1),
        }
    }

    /// Range of a 0-based line, without its line terminator.
    pub fn line_range(&self, line: usize) -> Option<Range> {
        let start = self.line_start(line)?;
        let stop = match self.newlines.get(line) {
            Some(&nl) if self.crlf[line] => nl - 1,
            Some(&nl) => nl,
            None => self.len,
        };
        Some(Range { start, stop })
    }

    /// 0-based line containing `offset`. A '\n' belongs to the line it ends.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.newlines.binary_search(&offset) {
            Ok(pos) => pos,
            Err(pos) => pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let index = LineIndex::build("ab\r\ncd\n\nef");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_range(0), Some(Range { start: 0, stop: 2 }));
        assert_eq!(index.line_range(1), Some(Range { start: 4, stop: 6 }));
        assert_eq!(index.line_range(2), Some(Range { start: 7, stop: 7 }));
        assert_eq!(index.line_range(3), Some(Range { start: 8, stop: 10 }));
        assert_eq!(index.line_range(4), None);
    }

    #[test]
    fn test_line_of_offset() {
        let index = LineIndex::build("ab\ncd");
        assert_eq!(index.line_of_offset(0), 0);
        assert_eq!(index.line_of_offset(2), 0);
        assert_eq!(index.line_of_offset(3), 1);
        assert_eq!(index.line_of_offset(5), 1);
    }

    #[test]
    fn test_empty_buffer() {
        let index = LineIndex::build("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_range(0), Some(Range { start: 0, stop: 0 }));
    }
}
