use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_FILE_SIZE: usize = u32::MAX as usize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceLocationError {
    #[error("File exceeds maximum size: {0} bytes")]
    FileTooLarge(usize),
    #[error("Byte offset {offset} is outside of a {len} byte source unit")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("Malformed source location `{0}`")]
    MalformedSrc(String),
}

pub type Result<T> = std::result::Result<T, SourceLocationError>;

/// Index of a source unit inside one IR graph, in insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceUnitId(pub u32);

impl fmt::Display for SourceUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit{}", self.0)
    }
}

/// Half-open `[start, end)` byte range into a source unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u32,
    pub end: u32,
}

impl ByteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: &ByteRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn contains_offset(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn merge(&self, other: &ByteRange) -> ByteRange {
        ByteRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A solc `src` attribute: `start:length:file_index`.
///
/// The compiler reports `-1` for locations it cannot attribute; those decode
/// to `None` for the respective component.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolcSrc {
    pub range: Option<ByteRange>,
    pub file_index: Option<u32>,
}

impl SolcSrc {
    pub fn parse(src: &str) -> Result<Self> {
        let malformed = || SourceLocationError::MalformedSrc(src.to_string());

        let mut parts = src.split(':');
        let start: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        let length: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        let file: i64 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let range = if start < 0 || length < 0 {
            None
        } else {
            let start = u32::try_from(start).map_err(|_| malformed())?;
            let length = u32::try_from(length).map_err(|_| malformed())?;
            Some(ByteRange::new(start, start.saturating_add(length)))
        };
        let file_index = u32::try_from(file).ok();

        Ok(Self { range, file_index })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line-start table for one source unit.
///
/// Built once from the raw text; every lookup is a binary search over the
/// sorted line-start offsets. Lines and columns are 1-based and columns count
/// characters, not bytes.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Arc<Vec<usize>>,
}

impl LineIndex {
    pub fn new(text: impl Into<Arc<str>>) -> Result<Self> {
        let text = text.into();
        if text.len() > MAX_FILE_SIZE {
            return Err(SourceLocationError::FileTooLarge(text.len()));
        }

        let line_starts = compute_line_starts(&text);

        Ok(Self {
            text,
            line_starts: Arc::new(line_starts),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn offset_to_line_col(&self, offset: usize) -> Result<LineCol> {
        if offset > self.text.len() {
            return Err(SourceLocationError::OffsetOutOfBounds {
                offset,
                len: self.text.len(),
            });
        }

        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line_idx];

        let bytes = self.text.as_bytes();
        let end = find_char_boundary(bytes, offset);
        let column = self.text[line_start..end].chars().count() + 1;

        Ok(LineCol {
            line: (line_idx + 1) as u32,
            column: column as u32,
        })
    }

    pub fn range_to_line_cols(&self, range: ByteRange) -> Result<(LineCol, LineCol)> {
        Ok((
            self.offset_to_line_col(range.start as usize)?,
            self.offset_to_line_col(range.end as usize)?,
        ))
    }

    pub fn get_line(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }

        let line_idx = line - 1;
        if line_idx >= self.line_starts.len() {
            return None;
        }

        let start = self.line_starts[line_idx];
        let end = if line_idx + 1 < self.line_starts.len() {
            self.line_starts[line_idx + 1]
        } else {
            self.text.len()
        };

        let text_bytes = self.text.as_bytes();
        let start_boundary = find_char_boundary(text_bytes, start);
        let end_boundary = find_char_boundary(text_bytes, end);

        std::str::from_utf8(&text_bytes[start_boundary..end_boundary])
            .ok()
            .map(|s| s.trim_end_matches(&['\r', '\n'][..]))
    }

    pub fn slice(&self, range: ByteRange) -> Option<&str> {
        self.text.get(range.start as usize..range.end as usize)
    }

    pub fn snippet(&self, range: ByteRange, context_lines: usize) -> Option<String> {
        let line = self.offset_to_line_col(range.start as usize).ok()?.line as usize;

        let start_line = line.saturating_sub(context_lines).max(1);
        let end_line = line.saturating_add(context_lines);

        let mut snippet = String::with_capacity(1024);
        for line_no in start_line..=end_line {
            if let Some(line_text) = self.get_line(line_no) {
                snippet.push_str(&format!("{:4} | {}\n", line_no, line_text));
            }
        }

        Some(snippet)
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut line_starts = Vec::with_capacity(1000);
    line_starts.push(0);

    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    i += 2;
                } else {
                    i += 1;
                }
                line_starts.push(i);
            }
            b'\n' => {
                i += 1;
                line_starts.push(i);
            }
            _ => {
                i += 1;
            }
        }
    }

    line_starts
}

fn find_char_boundary(bytes: &[u8], mut index: usize) -> usize {
    if index >= bytes.len() {
        return bytes.len();
    }

    while index > 0 && (bytes[index] & 0b1100_0000) == 0b1000_0000 {
        index -= 1;
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_range_basics() {
        let range = ByteRange::new(10, 30);
        assert_eq!(range.len(), 20);
        assert!(!range.is_empty());
        assert!(range.contains_offset(10));
        assert!(!range.contains_offset(30));

        assert!(ByteRange::new(5, 5).is_empty());
    }

    #[test]
    fn test_range_contains_and_merge() {
        let outer = ByteRange::new(10, 30);
        let inner = ByteRange::new(15, 20);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));

        let merged = ByteRange::new(10, 15).merge(&ByteRange::new(20, 25));
        assert_eq!(merged, ByteRange::new(10, 25));
    }

    #[test]
    fn test_parse_src() {
        let src = SolcSrc::parse("12:30:1").unwrap();
        assert_eq!(src.range, Some(ByteRange::new(12, 42)));
        assert_eq!(src.file_index, Some(1));

        let generated = SolcSrc::parse("-1:-1:-1").unwrap();
        assert_eq!(generated.range, None);
        assert_eq!(generated.file_index, None);

        assert!(SolcSrc::parse("1:2").is_err());
        assert!(SolcSrc::parse("a:2:0").is_err());
        assert!(SolcSrc::parse("1:2:0:4").is_err());
    }

    #[test]
    fn test_line_starts_unix() {
        let text = "line 1\nline 2\nline 3";
        let line_starts = compute_line_starts(text);
        assert_eq!(line_starts, vec![0, 7, 14]);
    }

    #[test]
    fn test_line_starts_windows() {
        let text = "line 1\r\nline 2\r\nline 3";
        let line_starts = compute_line_starts(text);
        assert_eq!(line_starts, vec![0, 8, 16]);
    }

    #[test]
    fn test_line_starts_mixed() {
        let text = "line 1\nline 2\r\nline 3\rline 4";
        let line_starts = compute_line_starts(text);
        assert_eq!(line_starts, vec![0, 7, 15, 22]);
    }

    #[test]
    fn test_offset_to_line_col() {
        let index = LineIndex::new("line 1\nline 2\nline 3").unwrap();

        assert_eq!(
            index.offset_to_line_col(7).unwrap(),
            LineCol { line: 2, column: 1 }
        );
        assert_eq!(
            index.offset_to_line_col(10).unwrap(),
            LineCol { line: 2, column: 4 }
        );
        assert_eq!(
            index.offset_to_line_col(0).unwrap(),
            LineCol { line: 1, column: 1 }
        );
    }

    #[test]
    fn test_offset_at_end_of_text() {
        let index = LineIndex::new("hello\nworld").unwrap();
        assert_eq!(
            index.offset_to_line_col(11).unwrap(),
            LineCol { line: 2, column: 6 }
        );
        assert!(matches!(
            index.offset_to_line_col(12),
            Err(SourceLocationError::OffsetOutOfBounds { offset: 12, len: 11 })
        ));
    }

    #[test]
    fn test_offset_on_newline_belongs_to_its_line() {
        let index = LineIndex::new("ab\ncd").unwrap();
        assert_eq!(
            index.offset_to_line_col(2).unwrap(),
            LineCol { line: 1, column: 3 }
        );
    }

    #[test]
    fn test_unicode_columns_count_chars() {
        let index = LineIndex::new("// é\nuint x;").unwrap();
        // "// é" is 5 bytes; offset 5 is the newline
        assert_eq!(
            index.offset_to_line_col(5).unwrap(),
            LineCol { line: 1, column: 5 }
        );
        assert_eq!(
            index.offset_to_line_col(11).unwrap(),
            LineCol { line: 2, column: 6 }
        );
    }

    #[test]
    fn test_snippet_extraction() {
        let index = LineIndex::new("line 1\nline 2\nline 3\nline 4\nline 5").unwrap();

        let snippet = index.snippet(ByteRange::new(7, 13), 1).unwrap();

        assert!(snippet.contains("1 | line 1"));
        assert!(snippet.contains("2 | line 2"));
        assert!(snippet.contains("3 | line 3"));
        assert!(!snippet.contains("4 | line 4"));
    }

    #[test]
    fn test_index_has_no_line_cap() {
        let lines = 1_500_000;
        let text = "x\n".repeat(lines);
        let index = LineIndex::new(text.as_str()).unwrap();

        assert_eq!(index.line_count(), lines + 1);
        let last = index.offset_to_line_col(text.len() - 2).unwrap();
        assert_eq!(last, LineCol { line: lines as u32, column: 1 });
        assert_eq!(index.get_line(lines), Some("x"));
    }

    #[test]
    fn test_get_line() {
        let index = LineIndex::new("line 1\r\nline 2\nline 3").unwrap();

        assert_eq!(index.get_line(1).unwrap(), "line 1");
        assert_eq!(index.get_line(2).unwrap(), "line 2");
        assert_eq!(index.get_line(3).unwrap(), "line 3");
        assert!(index.get_line(4).is_none());
        assert!(index.get_line(0).is_none());
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn test_slice() {
        let index = LineIndex::new("contract C {}").unwrap();
        assert_eq!(index.slice(ByteRange::new(9, 10)), Some("C"));
        assert_eq!(index.slice(ByteRange::new(9, 100)), None);
    }
}
