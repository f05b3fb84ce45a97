//! Core cron machinery: expression parsing and occurrence calculation.

pub mod expression;
pub mod field;
pub mod occurrence;
pub mod types;
