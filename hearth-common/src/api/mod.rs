//! Remote-function client
//!
//! The organizer's backend is a set of independently hosted functions,
//! each taking and returning JSON. They disagree on how credentials are
//! passed, so every [`Endpoint`] names its own [`AuthScheme`]. Long-running
//! generation functions hand back an `operationId` that is polled for
//! completion (see [`crate::polling`]).

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{apply_auth, AuthScheme, Credentials};
pub use client::{Endpoint, FunctionsClient, StatusEndpoint};
pub use types::{JobState, JobStatus, StartedJob};
