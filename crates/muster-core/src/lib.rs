//! Core types and trait definitions for Muster, the presence check-in
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the rotating token scheme, the session/check-in data model, the storage
//! and identity-lookup abstractions, and the [`service::Attendance`] service
//! that ties them together.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod checkin;
pub mod clock;
pub mod error;
pub mod identity;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

pub use error::{Error, Result};
