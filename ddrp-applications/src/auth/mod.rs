//! Authentication Module
//!
//! Token claim decoding, backend validation and role-based landing.
//! Signatures are never verified here; the backend is the authority.

pub mod claims;
pub mod validator;

pub use claims::{decode_claims, TokenClaims};
pub use validator::TokenValidator;

use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

/// Where a user lands after authentication is settled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Landing {
    /// No session: credentials required
    Login,
    /// Administrative dashboard
    Admin,
    /// Customer order page
    Orders,
}

impl Landing {
    pub fn for_role(role: Option<&str>) -> Self {
        if role == Some(ADMIN_ROLE) {
            Landing::Admin
        } else {
            Landing::Orders
        }
    }
}

impl std::fmt::Display for Landing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Landing::Login => write!(f, "login"),
            Landing::Admin => write!(f, "admin"),
            Landing::Orders => write!(f, "orders"),
        }
    }
}
