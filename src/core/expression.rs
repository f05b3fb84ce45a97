//! Cron expression parsing.
//!
//! A [`CronExpression`] is the parsed form of a 5- or 6-field cron
//! string: one ascending, deduplicated set of valid values per field.
//! Parsing validates every field eagerly; a parsed expression is
//! immutable and cheap to clone.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::field::{parse_field, FieldKind};

/// Errors that can occur when parsing a cron expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpressionError {
    /// Wrong field count, or an empty field (for example from a doubled
    /// space).
    #[error("malformed cron expression: {0}")]
    Malformed(String),

    /// A field term that failed to parse or fell outside its range.
    #[error("invalid {field} field '{text}': {reason}")]
    InvalidField {
        /// Which field the term belongs to.
        field: FieldKind,
        /// The raw offending term.
        text: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ExpressionError {
    pub(crate) fn invalid_field(
        field: FieldKind,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            text: text.into(),
            reason: reason.into(),
        }
    }
}

/// A parsed cron expression.
///
/// Fields are, in order: seconds (optional), minutes, hours,
/// day-of-month, month, day-of-week (0 = Sunday). Each field holds the
/// full set of values it matches; `*` expands to the whole range at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    text: String,
    seconds: BTreeSet<u32>,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
    days_of_week: BTreeSet<u32>,
}

impl CronExpression {
    /// Parse a cron expression.
    ///
    /// Accepts exactly five fields (`minute hour day-of-month month
    /// day-of-week`) or six (seconds prepended). With five fields the
    /// seconds set defaults to `{0}`. Fields are separated by single
    /// spaces; a doubled space produces an empty field and fails.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let fields: Vec<&str> = text.split(' ').collect();
        if fields.len() != 5 && fields.len() != 6 {
            return Err(ExpressionError::Malformed(format!(
                "expected 5 or 6 fields, got {}",
                fields.len()
            )));
        }
        if fields.iter().any(|field| field.is_empty()) {
            return Err(ExpressionError::Malformed("empty field".to_string()));
        }

        let offset = fields.len() - 5;
        let seconds = if offset == 1 {
            parse_field(fields[0], FieldKind::Second)?
        } else {
            BTreeSet::from([0])
        };

        Ok(Self {
            text: text.to_string(),
            seconds,
            minutes: parse_field(fields[offset], FieldKind::Minute)?,
            hours: parse_field(fields[offset + 1], FieldKind::Hour)?,
            days_of_month: parse_field(fields[offset + 2], FieldKind::DayOfMonth)?,
            months: parse_field(fields[offset + 3], FieldKind::Month)?,
            days_of_week: parse_field(fields[offset + 4], FieldKind::DayOfWeek)?,
        })
    }

    /// The original expression string.
    pub fn expression(&self) -> &str {
        &self.text
    }

    /// Matching seconds, 0-59.
    pub fn seconds(&self) -> &BTreeSet<u32> {
        &self.seconds
    }

    /// Matching minutes, 0-59.
    pub fn minutes(&self) -> &BTreeSet<u32> {
        &self.minutes
    }

    /// Matching hours, 0-23.
    pub fn hours(&self) -> &BTreeSet<u32> {
        &self.hours
    }

    /// Matching days of the month, 1-31.
    pub fn days_of_month(&self) -> &BTreeSet<u32> {
        &self.days_of_month
    }

    /// Matching months, 1-12.
    pub fn months(&self) -> &BTreeSet<u32> {
        &self.months
    }

    /// Matching days of the week, 0-6 with Sunday = 0.
    pub fn days_of_week(&self) -> &BTreeSet<u32> {
        &self.days_of_week
    }
}

impl FromStr for CronExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for CronExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for CronExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
