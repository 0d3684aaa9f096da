//! Parsing of stage parameter expressions.
//!
//! Parameters arrive as whitespace-separated number lists in strings, e.g.
//! `"0 360"` for a rotation range or `"0.2 0.8"` for a corner position. A
//! malformed expression never aborts a combine; the parser warns and leaves
//! the previous value in place.
use glam::Vec2;
use tracing::warn;

/// Closed interval a stage parameter is randomized over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Parses `"<n>"` or `"<low> <high>"` into `output`.
pub fn parse_range(output: &mut Range, input: &str) {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let parsed = match tokens.as_slice() {
        [single] => single.parse::<f64>().ok().map(|n| (n, n)),
        [low, high] => low
            .parse::<f64>()
            .ok()
            .zip(high.parse::<f64>().ok())
            .map(|(low, high)| (low, high)),
        _ => {
            warn!("Wrong range expression '{}'.", input);
            return;
        }
    };
    match parsed {
        Some((low, high)) => {
            output.low = low;
            output.high = high;
        }
        None => warn!("Wrong range expression '{}'.", input),
    }
}

/// Parses a range expressed in byte values and rescales it to `0..=1`.
///
/// The rescale applies even when parsing fails, matching how adjust ranges
/// are normalized after their defaults.
pub fn parse_range_scaled(output: &mut Range, input: &str) {
    parse_range(output, input);
    output.low /= 255.0;
    output.high /= 255.0;
}

/// Parses a range and replaces each non-zero bound with its reciprocal.
pub fn parse_inverse_range(output: &mut Range, input: &str) {
    parse_range(output, input);
    if output.low != 0.0 {
        output.low = 1.0 / output.low;
    }
    if output.high != 0.0 {
        output.high = 1.0 / output.high;
    }
}

/// Parses `"<x> <y>"` into `output`. Expressions with any other number of
/// tokens are ignored.
pub fn parse_vec2(output: &mut Vec2, input: &str) {
    let tokens: Vec<&str> = input.trim().split(' ').collect();
    let [x, y] = tokens.as_slice() else {
        return;
    };
    match x.parse::<f64>().ok().zip(y.parse::<f64>().ok()) {
        Some((x, y)) => *output = Vec2::new(x as f32, y as f32),
        None => warn!("Wrong vec2 expression '{}'.", input),
    }
}

/// Interprets a flag expression: zero and the empty string are off,
/// everything else is on.
pub fn parse_flag(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => n != 0.0,
        Err(_) => {
            warn!("Non-numeric flag expression '{}'.", input);
            true
        }
    }
}

/// Extracts the leading integer of an expression, ignoring any trailing
/// characters after the digits.
pub fn parse_leading_int(input: &str) -> Option<i32> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    if digits.is_empty() {
        return None;
    }
    let magnitude: i32 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
