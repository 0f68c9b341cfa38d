//! Core types and reconciliation rules for the quiz workflow.
//!
//! Students submit answers, teachers grade them, and both views are rebuilt
//! from a shared record store on every read. Records never reference each
//! other by id: identity is a natural key of field values ([`key`]), writes
//! are upserts on that key ([`upsert`]), and views are joins by content
//! equality ([`join`]).
//!
//! This crate has no database dependency; backends implement
//! [`store::RecordStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod join;
pub mod key;
pub mod record;
pub mod session;
pub mod store;
pub mod upsert;
pub mod workflow;

pub use error::{Error, Result, ValidationError};
pub use workflow::Quiz;
