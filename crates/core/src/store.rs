//! Flat-file persistence for cars, rentals and users.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::models::{Car, Record, RecordError, Rental, User};

/// File holding the car inventory.
pub const CARS_FILE: &str = "cars.json";
/// File holding every rental.
pub const RENTALS_FILE: &str = "rentals.json";
/// File holding registered accounts.
pub const USERS_FILE: &str = "users.json";

/// All three collections as read from storage.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Car inventory in storage order.
    pub cars: Vec<Car>,
    /// Rentals in storage order.
    pub rentals: Vec<Rental>,
    /// Accounts in storage order.
    pub users: Vec<User>,
}

/// Storage collaborator used by [`crate::RentalSystem`].
pub trait Persistence {
    /// Read all collections.
    fn load(&self) -> Result<Snapshot>;
    /// Replace the stored car inventory.
    fn save_cars(&self, cars: &[Car]) -> Result<()>;
    /// Replace the stored rentals.
    fn save_rentals(&self, rentals: &[Rental]) -> Result<()>;
    /// Replace the stored accounts.
    fn save_users(&self, users: &[User]) -> Result<()>;
}

/// Stores each collection as a pretty-printed JSON array in a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `root`, creating the directory and empty
    /// collection files on first use.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { root: root.into() };
        fs::create_dir_all(&store.root)
            .with_context(|| format!("failed to create {}", store.root.display()))?;
        for name in [CARS_FILE, RENTALS_FILE, USERS_FILE] {
            let path = store.root.join(name);
            if !path.exists() {
                debug!(path = %path.display(), "creating empty collection");
                write_records(&path, Vec::new())?;
            }
        }
        Ok(store)
    }

    /// Directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Persistence for JsonStore {
    fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            cars: read_collection(&self.path(CARS_FILE), Car::from_record)?,
            rentals: read_collection(&self.path(RENTALS_FILE), Rental::from_record)?,
            users: read_collection(&self.path(USERS_FILE), User::from_record)?,
        };
        debug!(
            cars = snapshot.cars.len(),
            rentals = snapshot.rentals.len(),
            users = snapshot.users.len(),
            "loaded data from {}",
            self.root.display()
        );
        Ok(snapshot)
    }

    fn save_cars(&self, cars: &[Car]) -> Result<()> {
        write_records(&self.path(CARS_FILE), cars.iter().map(Car::to_record).collect())
    }

    fn save_rentals(&self, rentals: &[Rental]) -> Result<()> {
        write_records(
            &self.path(RENTALS_FILE),
            rentals.iter().map(Rental::to_record).collect(),
        )
    }

    fn save_users(&self, users: &[User]) -> Result<()> {
        write_records(&self.path(USERS_FILE), users.iter().map(User::to_record).collect())
    }
}

fn read_collection<T>(
    path: &Path,
    decode: impl Fn(&Record) -> Result<T, RecordError>,
) -> Result<Vec<T>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            decode(record).with_context(|| format!("invalid entry {index} in {}", path.display()))
        })
        .collect()
}

fn write_records(path: &Path, records: Vec<Record>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let values: Vec<Value> = records.into_iter().map(Value::Object).collect();
    let serialised = serde_json::to_vec_pretty(&values)?;
    fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RentalStatus, Role};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_collections() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("data");
        let store = JsonStore::open(&root)?;

        for name in [CARS_FILE, RENTALS_FILE, USERS_FILE] {
            assert_eq!(fs::read_to_string(root.join(name))?.trim(), "[]");
        }
        let snapshot = store.load()?;
        assert!(snapshot.cars.is_empty());
        assert!(snapshot.rentals.is_empty());
        assert!(snapshot.users.is_empty());
        Ok(())
    }

    #[test]
    fn open_keeps_existing_files() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(USERS_FILE),
            r#"[{"username": "admin", "password": "admin123", "role": "admin"}]"#,
        )?;
        let store = JsonStore::open(dir.path())?;
        let users = store.load()?.users;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Admin);
        Ok(())
    }

    #[test]
    fn saved_collections_reload_in_order() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::open(dir.path())?;
        let cars = vec![
            Car::new(1, "BMW", "X5", 2022, Decimal::from(5000)),
            Car::new(2, "Honda", "Civic", 2018, Decimal::new(25005, 1)),
        ];
        let rentals = vec![Rental {
            id: 1,
            car_id: 2,
            username: "user1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            total_price: Decimal::new(50010, 1),
            status: RentalStatus::Cancelled,
        }];
        store.save_cars(&cars)?;
        store.save_rentals(&rentals)?;

        let snapshot = store.load()?;
        assert_eq!(snapshot.cars, cars);
        assert_eq!(snapshot.rentals, rentals);
        Ok(())
    }

    #[test]
    fn load_reports_bad_entry() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(CARS_FILE),
            r#"[{"id": 1, "brand": "BMW", "model": "X5", "year": 2022, "available": true}]"#,
        )?;
        let store = JsonStore::open(dir.path())?;
        let err = store.load().unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("invalid entry 0"), "{message}");
        assert!(message.contains("missing field `daily_price`"), "{message}");
        Ok(())
    }
}
