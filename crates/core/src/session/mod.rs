#![allow(missing_docs)]

//! Who is currently logged in.

use tracing::{info, warn};

use crate::{
    error::{RentalError, RentalResult},
    models::User,
};

/// Authentication state of the interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// Nobody is logged in.
    #[default]
    Anonymous,
    /// A user passed [`Session::login`].
    Authenticated(User),
}

impl Session {
    /// Authenticate against `users` by exact username and password match.
    ///
    /// On failure the current state is left untouched.
    pub fn login<'a>(
        &'a mut self,
        users: &[User],
        username: &str,
        password: &str,
    ) -> RentalResult<&'a User> {
        let Some(user) = users
            .iter()
            .find(|user| user.username == username && user.password == password)
        else {
            warn!(username, "login rejected");
            return Err(RentalError::InvalidCredentials);
        };
        info!(username, role = %user.role, "logged in");
        *self = Self::Authenticated(user.clone());
        self.require_user()
    }

    /// Drop back to anonymous, whatever the current state.
    pub fn logout(&mut self) {
        if let Self::Authenticated(user) = self {
            info!(username = %user.username, "logged out");
        }
        *self = Self::Anonymous;
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::is_admin)
    }

    /// The logged-in user or [`RentalError::NotAuthenticated`].
    pub fn require_user(&self) -> RentalResult<&User> {
        self.user().ok_or(RentalError::NotAuthenticated)
    }

    /// The logged-in admin; customers get [`RentalError::PermissionDenied`].
    pub fn require_admin(&self) -> RentalResult<&User> {
        let user = self.require_user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(RentalError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn users() -> Vec<User> {
        vec![
            User::new("admin", "admin123", Role::Admin),
            User::new("user1", "pass1", Role::Customer),
        ]
    }

    #[test]
    fn login_requires_exact_match() {
        let users = users();
        let mut session = Session::default();

        assert!(session.login(&users, "User1", "pass1").is_err());
        assert!(session.login(&users, "user1", "PASS1").is_err());
        assert_eq!(session, Session::Anonymous);

        let user = session.login(&users, "user1", "pass1").unwrap();
        assert_eq!(user.username, "user1");
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
    }

    #[test]
    fn failed_login_keeps_previous_user() {
        let users = users();
        let mut session = Session::default();
        session.login(&users, "admin", "admin123").unwrap();

        assert!(matches!(
            session.login(&users, "user1", "wrong"),
            Err(RentalError::InvalidCredentials)
        ));
        assert_eq!(session.user().map(|u| u.username.as_str()), Some("admin"));
    }

    #[test]
    fn role_gates() {
        let users = users();
        let mut session = Session::default();
        assert!(matches!(
            session.require_admin(),
            Err(RentalError::NotAuthenticated)
        ));

        session.login(&users, "user1", "pass1").unwrap();
        assert!(matches!(
            session.require_admin(),
            Err(RentalError::PermissionDenied)
        ));

        session.login(&users, "admin", "admin123").unwrap();
        assert!(session.require_admin().is_ok());

        session.logout();
        assert_eq!(session, Session::Anonymous);
        session.logout();
        assert_eq!(session, Session::Anonymous);
    }
}
