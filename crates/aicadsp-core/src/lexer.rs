//! Line classification for both text formats.
//!
//! The source language and the assembler listing are line oriented and share
//! their comment syntax, so one classifier serves both.

/// What a single input line turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Comment,
    /// A `MADRS[n] = <int>` table definition, kept verbatim.
    Madrs(&'a str),
    /// Anything else; the statement parser decides whether it means something.
    Statement(&'a str),
}

pub fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    // '#' also swallows preprocessor linemarkers.
    if line.starts_with('#') || line.starts_with("//") {
        return Line::Comment;
    }
    if is_madrs_definition(line) {
        return Line::Madrs(line);
    }
    Line::Statement(line)
}

fn is_madrs_definition(line: &str) -> bool {
    let Some(rest) = strip_prefix_ignore_case(line, "madrs") else {
        return false;
    };
    rest.trim_start().starts_with('[')
}

pub(crate) fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&s[prefix.len()..]),
        _ => None,
    }
}

/// Parses an unsigned literal, decimal or `0x`-prefixed hex.
pub(crate) fn parse_uint(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Parses a signed literal; the sign may only lead.
pub(crate) fn parse_int(s: &str) -> Option<i64> {
    match s.strip_prefix('-') {
        Some(digits) => {
            let value = parse_uint(digits.trim_start())?;
            i64::try_from(value).ok().map(|v| -v)
        }
        None => i64::try_from(parse_uint(s)?).ok(),
    }
}
