//! Indentation and line analysis over raw source.
//!
//! Every function works in byte offsets. The whitespace set is
//! `' '`, `'\n'`, `'\t'`, `'\r'`; all ASCII, so walking bytes never lands
//! inside a multi-byte character once the caller's offsets are validated.
//!
//! Offsets and ranges outside the source fail with `RangeError` instead of
//! being clamped.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::RangeError;
use crate::core::range::Range;
use crate::infra::line_index::LineIndex;

static BLOCK_COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)/\*.*?\*/|""".*?"""|'''.*?'''"#).expect("valid comment pattern")
});

static LINE_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(//|#).*$").expect("valid comment pattern"));

pub fn is_whitespace_char(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\t' | b'\r')
}

/// True for the empty string and strings made only of whitespace.
pub fn is_whitespace(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_whitespace())
}

pub fn is_whitespace_in(source: &str, range: Range) -> Result<bool, RangeError> {
    range.validate(source)?;
    Ok(is_whitespace(range.slice(source)))
}

fn check_offset(source: &str, offset: usize) -> Result<(), RangeError> {
    Range::point(offset).validate(source)
}

pub fn strip(source: &str, range: Range) -> Result<Range, RangeError> {
    left_strip(source, right_strip(source, range)?)
}

pub fn left_strip(source: &str, range: Range) -> Result<Range, RangeError> {
    range.validate(source)?;
    let bytes = source.as_bytes();
    let mut ret = range;
    while ret.start < ret.stop && is_ws(bytes[ret.start]) {
        ret.start += 1;
    }
    Ok(ret)
}

pub fn right_strip(source: &str, range: Range) -> Result<Range, RangeError> {
    range.validate(source)?;
    let bytes = source.as_bytes();
    let mut ret = range;
    while ret.stop > ret.start && is_ws(bytes[ret.stop - 1]) {
        ret.stop -= 1;
    }
    Ok(ret)
}

pub fn expand_left(source: &str, range: Range) -> Result<Range, RangeError> {
    range.validate(source)?;
    let bytes = source.as_bytes();
    let mut ret = range;
    while ret.start > 0 && is_ws(bytes[ret.start - 1]) {
        ret.start -= 1;
    }
    Ok(ret)
}

pub fn expand_right(source: &str, range: Range) -> Result<Range, RangeError> {
    range.validate(source)?;
    let bytes = source.as_bytes();
    let mut ret = range;
    while ret.stop < bytes.len() && is_ws(bytes[ret.stop]) {
        ret.stop += 1;
    }
    Ok(ret)
}

/// Expand left across whitespace, stopping after the first newline consumed.
pub fn expand_left_to_include_newline(source: &str, range: Range) -> Result<Range, RangeError> {
    range.validate(source)?;
    let bytes = source.as_bytes();
    let mut ret = range;
    while ret.start > 0 {
        let b = bytes[ret.start - 1];
        if !is_ws(b) {
            break;
        }
        ret.start -= 1;
        if b == b'\n' {
            break;
        }
    }
    Ok(ret)
}

/// Grow the range left to cover the indentation of its line, if the range
/// starts right after that indentation.
pub fn include_adjacent_indentation(source: &str, range: Range) -> Result<Range, RangeError> {
    let expanded = expand_left_to_include_newline(source, range)?;
    if expanded.start == 0 {
        // first line of the file
        return Ok(Range {
            start: 0,
            stop: expanded.stop,
        });
    }
    if source.as_bytes()[expanded.start] == b'\n' {
        return Ok(Range {
            start: expanded.start + 1,
            stop: expanded.stop,
        });
    }
    Ok(range)
}

pub fn followed_by_newline(source: &str, range: Range) -> Result<bool, RangeError> {
    let expanded = expand_right(source, range)?;
    Ok(source[range.stop..expanded.stop].contains('\n'))
}

pub fn preceded_by_newline(source: &str, range: Range) -> Result<bool, RangeError> {
    let expanded = expand_left_to_include_newline(source, range)?;
    Ok(expanded.start < range.start && source.as_bytes()[expanded.start] == b'\n')
}

/// Offset of the closest '\n' strictly before `position`.
pub fn previous_newline(source: &str, position: usize) -> Result<Option<usize>, RangeError> {
    check_offset(source, position)?;
    Ok(memchr::memrchr(b'\n', &source.as_bytes()[..position]))
}

/// Offset of the first '\n' at or after `position`, or the source length.
pub fn next_newline(source: &str, position: usize) -> Result<usize, RangeError> {
    check_offset(source, position)?;
    Ok(memchr::memchr(b'\n', &source.as_bytes()[position..])
        .map(|i| position + i)
        .unwrap_or(source.len()))
}

pub fn line_start(source: &str, position: usize) -> Result<usize, RangeError> {
    Ok(previous_newline(source, position)?.map_or(0, |nl| nl + 1))
}

pub fn line_end(source: &str, position: usize) -> Result<usize, RangeError> {
    next_newline(source, position)
}

pub fn next_non_whitespace(source: &str, position: usize) -> Result<usize, RangeError> {
    check_offset(source, position)?;
    let bytes = source.as_bytes();
    let mut i = position;
    while i < bytes.len() && is_ws(bytes[i]) {
        i += 1;
    }
    Ok(i)
}

/// First non-whitespace offset on the cursor's line, capped at the line end.
pub fn line_non_whitespace_start(source: &str, cursor: usize) -> Result<usize, RangeError> {
    let start = line_start(source, cursor)?;
    Ok(line_end(source, cursor)?.min(next_non_whitespace(source, start)?))
}

/// The literal leading whitespace of the cursor's line.
pub fn indentation_at_cursor(source: &str, cursor: usize) -> Result<&str, RangeError> {
    let start = line_start(source, cursor)?;
    let stop = line_non_whitespace_start(source, start)?;
    Ok(&source[start..stop])
}

/// Number of indentation units between the start of the line and the cursor.
pub fn indentation_level_at_cursor(
    source: &str,
    cursor: usize,
    default_level: usize,
) -> Result<usize, RangeError> {
    let token = indentation_token(source, default_level);
    if token.is_empty() {
        return Ok(0);
    }

    let column = cursor - line_start(source, cursor)?;
    if token == "\t" {
        return Ok(column);
    }
    Ok(column / token.len())
}

fn strip_comments(source: &str) -> Cow<'_, str> {
    match BLOCK_COMMENTS.replace_all(source, "") {
        Cow::Borrowed(s) => LINE_COMMENTS.replace_all(s, ""),
        Cow::Owned(s) => Cow::Owned(LINE_COMMENTS.replace_all(&s, "").into_owned()),
    }
}

/// The file's indentation unit.
///
/// A line starting with a tab means tabs. Otherwise the smallest leading
/// space count wins if more than 10% of indented lines use it, else
/// `default_level` spaces.
pub fn indentation_token(source: &str, default_level: usize) -> String {
    let source = strip_comments(source);

    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for line in source.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            return "\t".to_string();
        }

        let indentation = line.bytes().take_while(|&b| b == b' ').count();
        if indentation > 0 {
            *counts.entry(indentation).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    let level = counts
        .first_key_value()
        .filter(|&(_, &count)| count as f32 / total as f32 > 0.1)
        .map(|(&minimum, _)| minimum)
        .unwrap_or(default_level);

    " ".repeat(level)
}

pub fn indentation_for_level(source: &str, level: usize, default_level: usize) -> String {
    indentation_token(source, default_level).repeat(level)
}

/// Text of `range` with the indentation of its first line removed from
/// every line.
pub fn strip_indentation(source: &str, range: Range) -> Result<String, RangeError> {
    range.validate(source)?;
    let start = line_start(source, range.start)?;
    let non_ws = line_non_whitespace_start(source, range.start)?;
    let token = &source[start..non_ws];

    let lines: Vec<&str> = range
        .slice(source)
        .split('\n')
        .map(|line| line.strip_prefix(token).unwrap_or(line))
        .collect();
    Ok(lines.join("\n"))
}

/// Maximal runs of non-whitespace.
pub fn non_whitespace_ranges(source: &str) -> Vec<Range> {
    let mut ranges = Vec::new();
    let mut run_start = None;
    for (i, b) in source.bytes().enumerate() {
        match (run_start, is_ws(b)) {
            (None, false) => run_start = Some(i),
            (Some(start), true) => {
                ranges.push(Range { start, stop: i });
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        ranges.push(Range {
            start,
            stop: source.len(),
        });
    }
    ranges
}

/// Range of the 0-based line `index`, without its newline.
pub fn line_from_index(source: &str, index: usize) -> Option<Range> {
    LineIndex::build(source).line_range(index)
}

/// Split `range` at every newline; each piece excludes the newline.
pub fn line_ranges(source: &str, range: Range) -> Result<Vec<Range>, RangeError> {
    range.validate(source)?;
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut start = range.start;
    for i in range.start..=range.stop {
        if i == range.stop || bytes[i] == b'\n' {
            ranges.push(Range { start, stop: i });
            start = i + 1;
        }
    }
    Ok(ranges)
}
