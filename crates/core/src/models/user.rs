use std::{fmt, str::FromStr};

use serde_json::Value;

use super::{read_string, Record, RecordError};

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Regular renter; the role given on registration.
    #[default]
    Customer,
    /// May add cars and see every rental.
    Admin,
}

impl Role {
    /// Stored word for the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A registered account. Passwords are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Access level.
    pub role: Role,
}

impl User {
    /// Build an account with the given role.
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }

    /// Whether the account may perform admin-only operations.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Encode into the stored key-value form.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("username".into(), Value::from(self.username.as_str()));
        record.insert("password".into(), Value::from(self.password.as_str()));
        record.insert("role".into(), Value::from(self.role.as_str()));
        record
    }

    /// Decode from the stored key-value form.
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        let username = read_string(record, "username")?;
        let password = read_string(record, "password")?;
        let role = read_string(record, "role")?
            .parse()
            .map_err(|reason| RecordError::InvalidField {
                field: "role",
                reason,
            })?;
        Ok(Self {
            username,
            password,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_is_required() {
        let value = json!({"username": "user1", "password": "pass1"});
        assert_eq!(
            User::from_record(value.as_object().unwrap()).unwrap_err(),
            RecordError::MissingField("role")
        );
    }

    #[test]
    fn admin_round_trips() {
        let admin = User::new("admin", "admin123", Role::Admin);
        let decoded = User::from_record(&admin.to_record()).unwrap();
        assert!(decoded.is_admin());
        assert_eq!(decoded, admin);
    }
}
