//! # cirrus-core
//!
//! Core types and utilities for cirrus-rdp.
//!
//! This crate provides the foundational pieces shared by the API clients,
//! the URL resolvers, and the CLI:
//!
//! - [`error`] - Error types for the whole pipeline
//! - [`types`] - Cloud resource representations (instances, servers, arrays)
//! - [`config`] - Login configuration (accounts, hosts, refresh tokens)

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
