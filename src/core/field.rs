//! Cron field parsing.
//!
//! Each field of a cron expression is parsed independently into the
//! ordered set of integer values it matches within that field's valid
//! range. Parsing is strict: a malformed term fails the whole field,
//! values are never clamped or silently dropped.

use std::collections::BTreeSet;
use std::fmt;

use super::expression::ExpressionError;

/// The six positions of a cron expression, each with its own valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Seconds, 0-59. Optional; defaults to `{0}` in 5-field expressions.
    Second,
    /// Minutes, 0-59.
    Minute,
    /// Hours, 0-23.
    Hour,
    /// Day of month, 1-31.
    DayOfMonth,
    /// Month, 1-12.
    Month,
    /// Day of week, 0-6, Sunday = 0.
    DayOfWeek,
}

impl FieldKind {
    /// Inclusive bounds for values of this field.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            FieldKind::Second | FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::DayOfMonth => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::DayOfWeek => (0, 6),
        }
    }

    /// Field name as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Second => "second",
            FieldKind::Minute => "minute",
            FieldKind::Hour => "hour",
            FieldKind::DayOfMonth => "day-of-month",
            FieldKind::Month => "month",
            FieldKind::DayOfWeek => "day-of-week",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse one field substring into the set of values it matches.
///
/// The field is a comma-separated list of terms; each term is a literal,
/// `*`, a range `a-b`, or a step `base/step` where `base` is `*`, a
/// literal, or a range. The result is the union of all terms.
pub(crate) fn parse_field(text: &str, kind: FieldKind) -> Result<BTreeSet<u32>, ExpressionError> {
    let mut values = BTreeSet::new();
    for term in text.split(',') {
        parse_term(term, kind, &mut values)?;
    }
    Ok(values)
}

fn parse_term(term: &str, kind: FieldKind, out: &mut BTreeSet<u32>) -> Result<(), ExpressionError> {
    let (min, max) = kind.bounds();

    if term == "*" {
        out.extend(min..=max);
        return Ok(());
    }

    if let Some((base, step)) = term.split_once('/') {
        // The base narrows the window the step walks over: `*` keeps the
        // full range, a literal starts the sequence there, and a range
        // bounds it on both sides.
        let (start, end) = match base {
            "*" => (min, max),
            b if b.contains('-') => parse_range(b, kind, term)?,
            b => {
                let value = parse_number(b, kind, term)?;
                check_bounds(value, kind, term)?;
                (value, max)
            }
        };
        let step = parse_number(step, kind, term)?;
        if step == 0 || step > end {
            return Err(ExpressionError::invalid_field(
                kind,
                term,
                format!("step must be between 1 and {end}"),
            ));
        }
        out.extend((start..=end).step_by(step as usize));
        return Ok(());
    }

    if term.contains('-') {
        let (start, end) = parse_range(term, kind, term)?;
        out.extend(start..=end);
        return Ok(());
    }

    let value = parse_number(term, kind, term)?;
    check_bounds(value, kind, term)?;
    out.insert(value);
    Ok(())
}

fn parse_range(range: &str, kind: FieldKind, raw: &str) -> Result<(u32, u32), ExpressionError> {
    let Some((start, end)) = range.split_once('-') else {
        return Err(ExpressionError::invalid_field(kind, raw, "expected a range"));
    };
    let start = parse_number(start, kind, raw)?;
    let end = parse_number(end, kind, raw)?;
    check_bounds(start, kind, raw)?;
    check_bounds(end, kind, raw)?;
    if start > end {
        return Err(ExpressionError::invalid_field(
            kind,
            raw,
            format!("range start {start} exceeds end {end}"),
        ));
    }
    Ok((start, end))
}

fn parse_number(text: &str, kind: FieldKind, raw: &str) -> Result<u32, ExpressionError> {
    text.parse::<u32>().map_err(|_| {
        ExpressionError::invalid_field(kind, raw, format!("'{text}' is not a number"))
    })
}

fn check_bounds(value: u32, kind: FieldKind, raw: &str) -> Result<(), ExpressionError> {
    let (min, max) = kind.bounds();
    if value < min || value > max {
        return Err(ExpressionError::invalid_field(
            kind,
            raw,
            format!("value {value} is outside {min}-{max}"),
        ));
    }
    Ok(())
}
