//! Session Management Module
//!
//! Holds the bearer token and its identity claims, persists them across
//! restarts, and invalidates the session when the token expires or the
//! backend rejects it.

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::SessionManager;
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::*;
