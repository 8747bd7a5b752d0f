//! Demo sign-in for the retailer and admin dashboards.
//!
//! There is no account store: any non-blank email and password are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Retailer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Retailer => "retailer",
            Role::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Retailer => "Retailer",
            Role::Admin => "Admin",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Role::Retailer => Role::Admin,
            Role::Admin => Role::Retailer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Please enter both email and password")]
    MissingCredentials,
}

pub fn login(role: Role, credentials: &Credentials) -> Result<Role, LoginError> {
    if credentials.email.trim().is_empty() || credentials.password.trim().is_empty() {
        return Err(LoginError::MissingCredentials);
    }
    tracing::info!(role = %role, "signed in");
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn any_credentials_are_accepted() {
        assert_eq!(login(Role::Admin, &creds("a@b.c", "x")), Ok(Role::Admin));
        assert_eq!(
            login(Role::Retailer, &creds("shop@example.com", "hunter2")),
            Ok(Role::Retailer)
        );
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            login(Role::Admin, &creds("", "x")),
            Err(LoginError::MissingCredentials)
        );
        assert_eq!(
            login(Role::Retailer, &creds("a@b.c", "   ")),
            Err(LoginError::MissingCredentials)
        );
    }

    #[test]
    fn role_toggles_between_the_two_dashboards() {
        assert_eq!(Role::Retailer.toggled(), Role::Admin);
        assert_eq!(Role::Admin.toggled().toggled(), Role::Admin);
    }
}
