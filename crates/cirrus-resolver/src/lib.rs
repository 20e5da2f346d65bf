//! # cirrus-resolver
//!
//! Turns cloud-console URLs into launchable instance handles.
//!
//! - [`urls`] - classifies an input URL against the known console shapes
//! - [`resolve`] - one resolver per shape, chaining dependent lookups
//! - [`handle`] - a resolved instance plus the environment that can refresh it
//! - [`poll`] - waits until a handle has an address and a credential
//! - [`batch`] - runs poll + launch concurrently for every handle

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod handle;
pub mod poll;
pub mod resolve;
pub mod urls;

pub use batch::{launch_all, LaunchOptions, LaunchReport, Launcher};
pub use handle::Handle;
pub use poll::{wait_ready, WaitOptions};
pub use resolve::resolve_urls;
pub use urls::{classify, Target};
