//! Booking rules: availability, pricing, rental lifecycle and account
//! management over an in-memory working set that is written back to
//! [`Persistence`] after every mutation.

use std::collections::HashSet;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    clock::{Clock, SystemClock},
    error::{RentalError, RentalResult},
    models::{Car, EntityId, Rental, RentalStatus, Role, User, DATE_FORMAT},
    session::Session,
    store::Persistence,
};

/// Ids of cars blocked by an active rental whose end date is today or later.
///
/// This is not an interval-overlap check: such a rental blocks its car for
/// every requested range until its end date has passed. Cancelled rentals
/// never block.
pub fn unavailable_car_ids(rentals: &[Rental], today: NaiveDate) -> HashSet<EntityId> {
    rentals
        .iter()
        .filter(|rental| rental.is_active() && rental.end_date >= today)
        .map(|rental| rental.car_id)
        .collect()
}

/// Cars not blocked per [`unavailable_car_ids`], in inventory order.
pub fn available_cars<'a>(cars: &'a [Car], rentals: &[Rental], today: NaiveDate) -> Vec<&'a Car> {
    let blocked = unavailable_car_ids(rentals, today);
    cars.iter().filter(|car| !blocked.contains(&car.id)).collect()
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> RentalResult<NaiveDate> {
    let well_formed = text.len() == 10
        && text.char_indices().all(|(idx, ch)| match idx {
            4 | 7 => ch == '-',
            _ => ch.is_ascii_digit(),
        });
    if !well_formed {
        return Err(RentalError::InvalidDateFormat(text.to_string()));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| RentalError::InvalidDateFormat(text.to_string()))
}

/// Check a requested period against today and return its length in days.
pub fn rental_days(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> RentalResult<i64> {
    if start < today {
        return Err(RentalError::PastStartDate(start));
    }
    if end <= start {
        return Err(RentalError::NonPositiveDuration);
    }
    Ok((end - start).num_days())
}

/// Total charged for `days` rental days.
pub fn rental_price(days: i64, daily_price: Decimal) -> RentalResult<Decimal> {
    Decimal::from(days)
        .checked_mul(daily_price)
        .ok_or(RentalError::PriceOverflow)
}

/// Next identifier: the largest existing id plus one, starting from 1.
pub fn next_id(ids: impl IntoIterator<Item = EntityId>) -> RentalResult<EntityId> {
    ids.into_iter()
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(RentalError::IdsExhausted)
}

/// The car rental system: collections, session and storage in one place.
///
/// Single writer. Callers sharing it across threads must serialise access.
pub struct RentalSystem<P, C = SystemClock> {
    store: P,
    clock: C,
    cars: Vec<Car>,
    rentals: Vec<Rental>,
    users: Vec<User>,
    session: Session,
}

impl<P: Persistence> RentalSystem<P> {
    /// Load the working set from `store` using the local calendar date.
    pub fn open(store: P) -> Result<Self> {
        Self::with_clock(store, SystemClock)
    }
}

impl<P: Persistence, C: Clock> RentalSystem<P, C> {
    /// Load the working set from `store`, reading "today" from `clock`.
    pub fn with_clock(store: P, clock: C) -> Result<Self> {
        let snapshot = store.load()?;
        Ok(Self {
            store,
            clock,
            cars: snapshot.cars,
            rentals: snapshot.rentals,
            users: snapshot.users,
            session: Session::Anonymous,
        })
    }

    /// Current calendar date as seen by the booking rules.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Current authentication state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Logged-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Entire inventory in storage order.
    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    /// Look up a car by id.
    pub fn car(&self, id: EntityId) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    /// Registered accounts in storage order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Create the admin account unless a user with that name already exists.
    /// Returns whether an account was created.
    pub fn ensure_admin(&mut self, username: &str, password: &str) -> RentalResult<bool> {
        if self.users.iter().any(|user| user.username == username) {
            return Ok(false);
        }
        self.users.push(User::new(username, password, Role::Admin));
        if let Err(err) = self.store.save_users(&self.users) {
            self.users.pop();
            return Err(err.into());
        }
        info!(username, "created admin account");
        Ok(true)
    }

    /// Register a customer account. Does not log in.
    pub fn register_user(&mut self, username: &str, password: &str) -> RentalResult<()> {
        if self.users.iter().any(|user| user.username == username) {
            warn!(username, "registration rejected: username taken");
            return Err(RentalError::UsernameTaken(username.to_string()));
        }
        self.users.push(User::new(username, password, Role::Customer));
        if let Err(err) = self.store.save_users(&self.users) {
            self.users.pop();
            return Err(err.into());
        }
        info!(username, "registered user");
        Ok(())
    }

    /// Log in by exact username and password. See [`Session::login`].
    pub fn login(&mut self, username: &str, password: &str) -> RentalResult<&User> {
        self.session.login(&self.users, username, password)
    }

    /// End the current session.
    pub fn logout(&mut self) {
        self.session.logout();
    }

    /// Add a car to the inventory. Admin only.
    pub fn add_car(
        &mut self,
        brand: &str,
        model: &str,
        year: i32,
        daily_price: Decimal,
    ) -> RentalResult<&Car> {
        if let Err(err) = self.session.require_admin() {
            warn!(error = %err, "add car rejected");
            return Err(err);
        }
        let id = next_id(self.cars.iter().map(|car| car.id))?;
        self.cars.push(Car::new(id, brand, model, year, daily_price));
        if let Err(err) = self.store.save_cars(&self.cars) {
            self.cars.pop();
            return Err(err.into());
        }
        info!(car_id = id, brand, model, year, %daily_price, "added car");
        self.car(id).ok_or(RentalError::CarNotFound(id))
    }

    /// Cars that can be booked today.
    pub fn available_cars(&self) -> Vec<&Car> {
        available_cars(&self.cars, &self.rentals, self.today())
    }

    /// Book `car_id` from `start_date` to `end_date` (both `YYYY-MM-DD`) for
    /// the logged-in user and return the total price.
    pub fn rent_car(
        &mut self,
        car_id: EntityId,
        start_date: &str,
        end_date: &str,
    ) -> RentalResult<Decimal> {
        let result = self.book(car_id, start_date, end_date);
        if let Err(err) = &result {
            warn!(car_id, start_date, end_date, error = %err, "booking rejected");
        }
        result
    }

    fn book(&mut self, car_id: EntityId, start_date: &str, end_date: &str) -> RentalResult<Decimal> {
        let username = self.session.require_user()?.username.clone();
        let daily_price = self
            .car(car_id)
            .ok_or(RentalError::CarNotFound(car_id))?
            .daily_price;
        let today = self.today();
        if unavailable_car_ids(&self.rentals, today).contains(&car_id) {
            return Err(RentalError::CarUnavailable(car_id));
        }
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        let days = rental_days(start, end, today)?;
        let total_price = rental_price(days, daily_price)?;

        let id = next_id(self.rentals.iter().map(|rental| rental.id))?;
        self.rentals.push(Rental {
            id,
            car_id,
            username: username.clone(),
            start_date: start,
            end_date: end,
            total_price,
            status: RentalStatus::Active,
        });
        if let Err(err) = self.store.save_rentals(&self.rentals) {
            self.rentals.pop();
            return Err(err.into());
        }
        info!(rental_id = id, car_id, %username, days, %total_price, "car rented");
        Ok(total_price)
    }

    /// Rentals of the logged-in user in storage order; empty when anonymous.
    pub fn user_rentals(&self) -> Vec<&Rental> {
        let Some(user) = self.session.user() else {
            return Vec::new();
        };
        self.rentals
            .iter()
            .filter(|rental| rental.username == user.username)
            .collect()
    }

    /// Cancel one of the logged-in user's rentals. Cancelling an already
    /// cancelled rental succeeds again. Rentals owned by someone else are
    /// reported as not found, admins included.
    pub fn cancel_rental(&mut self, rental_id: EntityId) -> RentalResult<()> {
        let username = self.session.require_user()?.username.clone();
        let Some(index) = self
            .rentals
            .iter()
            .position(|rental| rental.id == rental_id && rental.username == username)
        else {
            warn!(rental_id, %username, "cancel rejected");
            return Err(RentalError::RentalNotFound(rental_id));
        };
        let previous = self.rentals[index].status;
        self.rentals[index].status = RentalStatus::Cancelled;
        if let Err(err) = self.store.save_rentals(&self.rentals) {
            self.rentals[index].status = previous;
            return Err(err.into());
        }
        info!(rental_id, %username, "rental cancelled");
        Ok(())
    }

    /// Every rental in storage order. Admin only.
    pub fn all_rentals(&self) -> RentalResult<&[Rental]> {
        self.session.require_admin()?;
        Ok(&self.rentals)
    }
}
