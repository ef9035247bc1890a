use std::fmt;

use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    money_value, read_bool, read_i32, read_id, read_money, read_string, EntityId, Record,
    RecordError,
};

/// A car in the rental inventory.
///
/// `available` is informational only; whether a car can be booked is derived
/// from the rental history, see [`crate::engine::unavailable_car_ids`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    /// Unique identifier, assigned as max existing id + 1.
    pub id: EntityId,
    /// Manufacturer name.
    pub brand: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Price charged per rental day.
    pub daily_price: Decimal,
    /// Stored availability flag.
    pub available: bool,
}

impl Car {
    /// Build a freshly added car.
    pub fn new(
        id: EntityId,
        brand: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        daily_price: Decimal,
    ) -> Self {
        Self {
            id,
            brand: brand.into(),
            model: model.into(),
            year,
            daily_price,
            available: true,
        }
    }

    /// Encode into the stored key-value form.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("id".into(), Value::from(self.id));
        record.insert("brand".into(), Value::from(self.brand.as_str()));
        record.insert("model".into(), Value::from(self.model.as_str()));
        record.insert("year".into(), Value::from(self.year));
        record.insert("daily_price".into(), money_value(self.daily_price));
        record.insert("available".into(), Value::from(self.available));
        record
    }

    /// Decode from the stored key-value form.
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: read_id(record, "id")?,
            brand: read_string(record, "brand")?,
            model: read_string(record, "model")?,
            year: read_i32(record, "year")?,
            daily_price: read_money(record, "daily_price")?,
            available: read_bool(record, "available")?,
        })
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) - {}/day",
            self.brand, self.model, self.year, self.daily_price
        )
    }
}
