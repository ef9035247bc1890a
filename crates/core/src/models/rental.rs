use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    date_value, money_value, read_date, read_id, read_money, read_string, EntityId, Record,
    RecordError,
};

/// Lifecycle of a rental. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RentalStatus {
    /// Booking in force.
    #[default]
    Active,
    /// Booking withdrawn by its owner.
    Cancelled,
}

impl RentalStatus {
    /// Stored word for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown rental status '{other}'")),
        }
    }
}

/// A booking of one car by one user over `[start_date, end_date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rental {
    /// Unique identifier, assigned as max existing id + 1.
    pub id: EntityId,
    /// Booked car.
    pub car_id: EntityId,
    /// Owner of the booking.
    pub username: String,
    /// First rental day.
    pub start_date: NaiveDate,
    /// Return day; always after `start_date`.
    pub end_date: NaiveDate,
    /// Days between the dates times the car's daily price.
    pub total_price: Decimal,
    /// Current lifecycle state.
    pub status: RentalStatus,
}

impl Rental {
    /// Whether the rental still counts against availability.
    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }

    /// Encode into the stored key-value form.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("id".into(), Value::from(self.id));
        record.insert("car_id".into(), Value::from(self.car_id));
        record.insert("username".into(), Value::from(self.username.as_str()));
        record.insert("start_date".into(), date_value(self.start_date));
        record.insert("end_date".into(), date_value(self.end_date));
        record.insert("total_price".into(), money_value(self.total_price));
        record.insert("status".into(), Value::from(self.status.as_str()));
        record
    }

    /// Decode from the stored key-value form. A missing `status` means active.
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        let status = match record.get("status") {
            None => RentalStatus::Active,
            Some(_) => read_string(record, "status")?
                .parse()
                .map_err(|reason| RecordError::InvalidField {
                    field: "status",
                    reason,
                })?,
        };
        Ok(Self {
            id: read_id(record, "id")?,
            car_id: read_id(record, "car_id")?,
            username: read_string(record, "username")?,
            start_date: read_date(record, "start_date")?,
            end_date: read_date(record, "end_date")?,
            total_price: read_money(record, "total_price")?,
            status,
        })
    }
}

impl fmt::Display for Rental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rental #{}: {} → {} - {}",
            self.id, self.start_date, self.end_date, self.total_price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 7,
            "car_id": 2,
            "username": "user1",
            "start_date": "2026-10-16",
            "end_date": "2026-10-19",
            "total_price": 15000.0
        })
    }

    #[test]
    fn missing_status_defaults_to_active() {
        let rental = Rental::from_record(sample().as_object().unwrap()).unwrap();
        assert_eq!(rental.status, RentalStatus::Active);
        assert_eq!(rental.total_price, Decimal::from(15000));
        assert_eq!(rental.to_record()["status"], json!("active"));
    }

    #[test]
    fn cancelled_status_survives_encoding() {
        let mut rental = Rental::from_record(sample().as_object().unwrap()).unwrap();
        rental.status = RentalStatus::Cancelled;
        let decoded = Rental::from_record(&rental.to_record()).unwrap();
        assert_eq!(decoded, rental);
        assert_eq!(
            decoded.to_string(),
            "Rental #7: 2026-10-16 → 2026-10-19 - 15000"
        );
    }

    #[test]
    fn unknown_status_is_invalid() {
        let mut value = sample();
        value["status"] = json!("returned");
        let err = Rental::from_record(value.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "status", .. }));
    }

    #[test]
    fn malformed_date_is_invalid() {
        let mut value = sample();
        value["end_date"] = json!("19.10.2026");
        let err = Rental::from_record(value.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "end_date", .. }));
    }

    #[test]
    fn username_is_required() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("username");
        let err = Rental::from_record(value.as_object().unwrap()).unwrap_err();
        assert_eq!(err, RecordError::MissingField("username"));
    }
}
