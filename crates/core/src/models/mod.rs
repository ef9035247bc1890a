//! Shared domain models and their record encoding.
//!
//! Every entity converts to and from a [`Record`], the string-keyed map that
//! the persistence layer stores as one element of a JSON array.

mod car;
mod rental;
mod user;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub use car::Car;
pub use rental::{Rental, RentalStatus};
pub use user::{Role, User};

/// Identifier shared by cars and rentals.
pub type EntityId = u32;

/// Generic key-value form of a stored entity.
pub type Record = Map<String, Value>;

/// Failure decoding an entity from its [`Record`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// A required key is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A key is present but its value has the wrong shape.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending key.
        field: &'static str,
        /// Human readable description of the problem.
        reason: String,
    },
}

impl RecordError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub(crate) fn required<'a>(
    record: &'a Record,
    field: &'static str,
) -> Result<&'a Value, RecordError> {
    record.get(field).ok_or(RecordError::MissingField(field))
}

pub(crate) fn read_id(record: &Record, field: &'static str) -> Result<EntityId, RecordError> {
    let value = required(record, field)?;
    value
        .as_u64()
        .and_then(|raw| EntityId::try_from(raw).ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            RecordError::invalid(field, format!("expected positive integer, got {value}"))
        })
}

pub(crate) fn read_i32(record: &Record, field: &'static str) -> Result<i32, RecordError> {
    let value = required(record, field)?;
    value
        .as_i64()
        .and_then(|raw| i32::try_from(raw).ok())
        .ok_or_else(|| RecordError::invalid(field, format!("expected integer, got {value}")))
}

pub(crate) fn read_string(record: &Record, field: &'static str) -> Result<String, RecordError> {
    match required(record, field)? {
        Value::String(text) => Ok(text.clone()),
        other => Err(RecordError::invalid(field, format!("expected string, got {other}"))),
    }
}

pub(crate) fn read_bool(record: &Record, field: &'static str) -> Result<bool, RecordError> {
    match required(record, field)? {
        Value::Bool(flag) => Ok(*flag),
        other => Err(RecordError::invalid(field, format!("expected boolean, got {other}"))),
    }
}

pub(crate) fn read_date(record: &Record, field: &'static str) -> Result<NaiveDate, RecordError> {
    let text = read_string(record, field)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|err| RecordError::invalid(field, format!("'{text}': {err}")))
}

/// Money is accepted either as a JSON number or as a numeric string.
pub(crate) fn read_money(record: &Record, field: &'static str) -> Result<Decimal, RecordError> {
    let value = required(record, field)?;
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        other => {
            return Err(RecordError::invalid(
                field,
                format!("expected number, got {other}"),
            ))
        }
    };
    parse_money(&text).map_err(|err| RecordError::invalid(field, format!("'{text}': {err}")))
}

fn parse_money(text: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(|amount| amount.normalize())
}

/// Amounts a JSON number cannot carry exactly are written as strings.
pub(crate) fn money_value(amount: Decimal) -> Value {
    if amount.fract().is_zero() {
        if let Some(whole) = amount.to_i64() {
            return Value::from(whole);
        }
    }
    amount
        .to_f64()
        .and_then(Number::from_f64)
        .filter(|number| parse_money(&number.to_string()).ok() == Some(amount))
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(amount.to_string()))
}

pub(crate) fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format(DATE_FORMAT).to_string())
}

/// Calendar date layout used in records and user input (ISO 8601).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
