//! # cirrus-api
//!
//! Clients for the two cloud-management API generations, plus the
//! [`Environment`](environment::Environment) that owns them.
//!
//! The modern generation (1.5) serves individual resources by href; the
//! legacy generation (1.6) serves collections keyed by numeric legacy ids.
//! Both authenticate by exchanging an account's OAuth refresh token for an
//! access token on first use.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod environment;

pub use client::{CmClient, LegacyClient};
pub use environment::{Environment, Environments};

/// Result alias re-exported from cirrus-core.
pub use cirrus_core::Result;
