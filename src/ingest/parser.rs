//! Field level parsing and preamble sniffing.

use super::aliases::{exact_match, keyword_match, normalize_header};

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 10;

/// Minimum number of non-empty cells in a header row
pub const HEADER_MIN_CELLS: usize = 5;
/// Minimum number of header cells that must resolve to a channel
pub const HEADER_MIN_MATCHES: usize = 3;
const UNITS_MIN_CELLS: usize = 4;
const UNITS_MIN_PERCENT: usize = 60;
const UNIT_MAX_LEN: usize = 8;

/// Parses one raw field. Returns `None` for anything that is not plausibly a
/// number; a comma is accepted as the decimal separator. Never fails.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | ',' | 'e' | 'E'))
    {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Picks the delimiter with the highest count over the first non-blank lines.
/// Comma on ties or when nothing is found.
pub fn sniff_delimiter(text: &str) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    for line in text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
    {
        for byte in line.bytes() {
            if let Some(pos) = DELIMITERS.iter().position(|d| *d == byte) {
                counts[pos] += 1;
            }
        }
    }
    let mut best = 0;
    for (pos, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = pos;
        }
    }
    DELIMITERS[best]
}

/// True when the row looks like the channel header: enough non-empty cells
/// and enough of them known to the alias dictionary.
pub fn is_header_row(row: &[String]) -> bool {
    let normalized = row
        .iter()
        .map(|c| normalize_header(c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>();
    if normalized.len() < HEADER_MIN_CELLS {
        return false;
    }
    let matches = normalized
        .iter()
        .filter(|c| exact_match(c).is_some() || keyword_match(c).is_some())
        .count();
    matches >= HEADER_MIN_MATCHES
}

/// Index of the first header row among `rows`, if any.
pub fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().position(|row| is_header_row(row))
}

/// Short, number-free token made of letters and punctuation, such as `s`,
/// `km/h`, `°C`, `[%]` or `m/s^2`.
pub fn is_unit_token(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() || token.chars().count() > UNIT_MAX_LEN || parse_number(token).is_some() {
        return false;
    }
    let mut prev = ' ';
    for c in token.chars() {
        let allowed = c.is_alphabetic()
            || c.is_ascii_punctuation()
            || matches!(c, '°' | '²' | '³' | 'µ' | ' ')
            || (c.is_ascii_digit() && prev == '^');
        if !allowed {
            return false;
        }
        prev = c;
    }
    true
}

/// True when at least 60% of the non-empty cells (and at least four of
/// them) look like units.
pub fn is_units_row(row: &[String]) -> bool {
    let cells = row
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>();
    if cells.len() < UNITS_MIN_CELLS {
        return false;
    }
    let units = cells.iter().filter(|c| is_unit_token(c)).count();
    units * 100 >= UNITS_MIN_PERCENT * cells.len()
}
