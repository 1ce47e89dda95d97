//! # Hearth Common Library
//!
//! Shared code for the Hearth family organizer including:
//! - Recurring-task next-occurrence calculation
//! - Due-date badge text
//! - Roles, permissions and point-of-action access checks
//! - Household model (members and tasks)
//! - Persisted session store
//! - Configuration loading
//! - Remote-function client and job poller

pub mod access;
pub mod api;
pub mod badge;
pub mod config;
pub mod error;
pub mod family;
pub mod polling;
pub mod recurrence;
pub mod session;
pub mod time;

pub use access::{AccessControl, Permission, PermissionSet, Role};
pub use error::{Error, Result};
pub use recurrence::{next_occurrence, Frequency, Recurrence, RecurringPattern};
