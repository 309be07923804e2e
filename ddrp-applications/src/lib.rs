//! DDRP Applications - Session lifecycle, invoice composition and dashboard operations
//!
//! This crate holds everything the dashboard does on the client side:
//!
//! - Session management: login, logout, startup restore with backend
//!   validation, and the periodic expiry sweep
//! - GST invoice drafts with live line and grand totals
//! - Dashboard actions over orders, raw materials and invoices, each
//!   reporting its outcome as a user-facing notice
//!
//! ## Architecture
//!
//! - **Core** (ddrp-core): errors, configuration, backend records
//! - **Client** (ddrp-client): HTTP calls
//! - **Applications** (this crate): client-side state and rules
//! - **Presentation** (ddrp-cli): user interface

pub mod auth;
pub mod dashboard;
pub mod invoice;
pub mod notice;
pub mod session;

pub use auth::{decode_claims, Landing, TokenClaims, TokenValidator};
pub use dashboard::{filter_orders, Dashboard, StatusFilter};
pub use invoice::{
    format_amount, grand_total, line_total, InvoiceDraft, InvoiceEditor, InvoiceTotals,
    LineBreakdown, LineUpdate,
};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use session::{
    ExpiryCheck, FileSessionStore, MemorySessionStore, RestoreOutcome, SessionManager,
    SessionState, SessionStore,
};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] ddrp_core::DdrpError),

    #[error("Permission error: {message}")]
    Permission { message: String },

    /// Removing the last line of an invoice draft
    #[error("At least one line item is required")]
    MinimumOneLine,
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create a permission error
    pub fn permission<S: Into<String>>(message: S) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Whether the error means the session must end
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Core(error) => error.is_auth_failure(),
            _ => false,
        }
    }

    /// Text suitable for a notice: backend detail or local message, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Core(error) => error.user_message(fallback),
            Self::Permission { message } => message.clone(),
            Self::MinimumOneLine => self.to_string(),
        }
    }
}
