//! A resolved instance and the environment that can refresh it.

use cirrus_api::Environment;
use cirrus_core::types::{AddressKind, Instance};
use cirrus_core::{Error, Result};
use std::sync::Arc;

/// A resolved instance handle.
///
/// Owns the instance's mutable remote-access attributes and shares the
/// environment they were resolved under; the poller replaces the instance
/// fields in place on each refresh.
#[derive(Debug, Clone)]
pub struct Handle {
    instance: Instance,
    environment: Arc<Environment>,
}

impl Handle {
    /// Pair an instance representation with its owning environment.
    #[must_use]
    pub fn new(instance: Instance, environment: Arc<Environment>) -> Self {
        Self {
            instance,
            environment,
        }
    }

    /// The instance's current representation.
    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// The environment this handle was resolved under.
    #[must_use]
    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    /// The instance's self href.
    ///
    /// # Panics
    ///
    /// Every API representation is expected to carry a `self` link; one
    /// without it is a programming error, not a recoverable condition.
    #[must_use]
    pub fn href(&self) -> &str {
        self.instance.links.find("self").unwrap_or_else(|| {
            panic!(
                "no self href for instance: links {:?}",
                self.instance.links
            )
        })
    }

    /// The instance's initial credential, when present and non-empty.
    #[must_use]
    pub fn admin_password(&self) -> Option<&str> {
        self.instance
            .admin_password
            .as_deref()
            .filter(|password| !password.is_empty())
    }

    /// The address at the given interface index for the selected family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] when the index does not exist,
    /// carrying the index, self href, and the full address list.
    pub fn ip_address(&self, kind: AddressKind, index: usize) -> Result<&str> {
        let addresses = self.instance.addresses(kind);
        addresses
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::IndexOutOfBounds {
                index,
                href: self.href().to_string(),
                addresses: addresses.to_vec(),
            })
    }

    /// Replace the instance fields with a freshly fetched representation,
    /// keeping the owning environment.
    pub(crate) fn replace(&mut self, instance: Instance) {
        self.instance = instance;
    }

    /// Consume the handle, yielding the instance representation.
    pub(crate) fn into_instance(self) -> Instance {
        self.instance
    }
}
