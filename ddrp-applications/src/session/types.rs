//! Session Types and Structures

use crate::auth::{Landing, ADMIN_ROLE};
use serde::{Deserialize, Serialize};

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key of the role claim
pub const ROLE_KEY: &str = "role";
/// Storage key of the user id claim
pub const USER_ID_KEY: &str = "userId";

/// In-memory session: absent token means logged out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub token: Option<String>,
    pub role: Option<String>,
    pub user_id: Option<String>,
}

impl SessionState {
    /// True iff a non-empty token is held
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.role.as_deref() == Some(ADMIN_ROLE)
    }

    pub fn landing(&self) -> Landing {
        if self.is_authenticated() {
            Landing::for_role(self.role.as_deref())
        } else {
            Landing::Login
        }
    }
}

/// How the startup restore ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was persisted
    NoSession,
    /// The persisted token is still accepted
    Restored,
    /// `exp` had passed; no network call was made
    Expired,
    /// Malformed token, or the backend rejected it
    Invalid,
    /// A logout landed while validation was in flight and was kept
    Superseded,
}

/// Result of one expiry sweep tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    NoSession,
    Valid,
    Expired,
    Malformed,
}
