//! DDRP Client - Typed access to the order, inventory and invoice backend
//!
//! Every call is fire-and-await: no retries, no backoff, no cancellation.

pub mod api;

pub use api::{ApiClientConfig, BackendClient};
