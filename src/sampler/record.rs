//! Parsing of individual match-file lines into [`MatchRecord`]s.
//!
//! Lines are comma-delimited `seed,level,name` triples. Only the seed is
//! required; a value may be wrapped in `"` to carry embedded commas.

use thiserror::Error;

/// Level assumed when the field is missing or not a non-negative integer.
pub const DEFAULT_LEVEL: u32 = 1;

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// One parsed line of a match file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Seed identifier reported by the search process.
    pub seed: String,
    /// Match level; 1-based position into the result-name list when `name` is empty.
    pub level: u32,
    /// Result name, empty when the line carries only seed and level.
    pub name: String,
}

/// Reasons a single line is skipped instead of producing a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    /// The line is empty or whitespace only.
    #[error("blank line")]
    Blank,
    /// The first field is empty.
    #[error("missing seed field")]
    EmptySeed,
    /// A quoted value never closes.
    #[error("unterminated quoted field")]
    UnterminatedQuote,
}

/// Parse one line (with or without its line terminator) into a record.
pub fn parse_line(line: &str) -> Result<MatchRecord, Malformed> {
    let line = strip_terminator(line);
    if line.trim().is_empty() {
        return Err(Malformed::Blank);
    }
    let mut fields = split_fields(line)?.into_iter();
    let seed = fields.next().unwrap_or_default();
    if seed.is_empty() {
        return Err(Malformed::EmptySeed);
    }
    let level = fields
        .next()
        .map(|field| parse_level(&field))
        .unwrap_or(DEFAULT_LEVEL);
    let name = fields.next().unwrap_or_default();
    Ok(MatchRecord { seed, level, name })
}

/// Heuristic for a header row: the first field mentions "seed", or the second
/// field is present but not numeric (`match`, `level`, ...).
pub fn looks_like_header(line: &str) -> bool {
    let Ok(fields) = split_fields(strip_terminator(line)) else {
        return false;
    };
    if fields
        .first()
        .is_some_and(|first| first.to_ascii_lowercase().contains("seed"))
    {
        return true;
    }
    fields
        .get(1)
        .is_some_and(|second| !second.is_empty() && second.parse::<i64>().is_err())
}

/// Split a line on commas, honouring `"`-quoted values and `""` escapes.
///
/// Fields are trimmed and stripped of their surrounding quotes.
pub fn split_fields(line: &str) -> Result<Vec<String>, Malformed> {
    let mut fields = Vec::with_capacity(3);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            QUOTE if in_quotes => {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    current.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            }
            QUOTE if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            DELIMITER if !in_quotes => fields.push(take_field(&mut current)),
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return Err(Malformed::UnterminatedQuote);
    }
    fields.push(take_field(&mut current));
    Ok(fields)
}

fn take_field(current: &mut String) -> String {
    let field = std::mem::take(current);
    let trimmed = field.trim();
    if trimmed.len() == field.len() {
        field
    } else {
        trimmed.to_string()
    }
}

fn parse_level(field: &str) -> u32 {
    field.parse().unwrap_or(DEFAULT_LEVEL)
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
