//! Core types and the identity-resolution engine for MATM contact ingestion.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! engine reads and writes through the [`store::ContactStore`] trait; the
//! decision itself lives in the pure [`matcher::classify`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod engine;
pub mod error;
pub mod ids;
pub mod lock;
pub mod matcher;
pub mod propagator;
pub mod resolver;
pub mod store;
pub mod submission;

pub use engine::{Engine, Outcome};
pub use error::{Error, Result};
pub use matcher::Disposition;
pub use resolver::ConflictPolicy;
pub use submission::{Submission, SubmissionInput, ValidationError};

#[cfg(test)]
mod tests;
