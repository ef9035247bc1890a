#![warn(clippy::all, missing_docs)]

//! Core domain logic for the car rental desk.
//!
//! This crate hosts the entity models and their record encoding, the
//! flat-file persistence layer, the login session, the booking engine and
//! configuration handling used by the terminal UI.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod session;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use engine::RentalSystem;
pub use error::{ErrorKind, RentalError, RentalResult};
pub use models::{Car, EntityId, Rental, RentalStatus, Role, User};
pub use session::Session;
pub use store::{JsonStore, Persistence, Snapshot};
