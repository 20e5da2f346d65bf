//! Cloud resource representations.
//!
//! These mirror the JSON shapes returned by the cloud-management API:
//! instances, servers, and server arrays all carry a link table (ordered
//! relation/href pairs), and instances additionally carry their address
//! lists and, in the sensitive view, the initial login credential.

use serde::{Deserialize, Serialize};

/// Field-selection mode for instance lookups.
///
/// The sensitive view includes secret fields such as the initial
/// Administrator password; the default view does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Standard field set, no secrets.
    Default,
    /// Extended field set including the initial credential.
    Sensitive,
}

impl View {
    /// Select the view for a given prompt setting: prompting for a login
    /// means secrets are never fetched.
    #[must_use]
    pub const fn for_prompt(prompt: bool) -> Self {
        if prompt {
            Self::Default
        } else {
            Self::Sensitive
        }
    }

    /// Query parameters to send for this view, if any.
    #[must_use]
    pub fn query(self) -> Vec<(&'static str, String)> {
        match self {
            Self::Default => Vec::new(),
            Self::Sensitive => vec![("view", "sensitive".to_string())],
        }
    }
}

/// Which address family of an instance to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Public IP addresses.
    Public,
    /// Private IP addresses.
    Private,
}

impl AddressKind {
    /// Map the CLI's `--private` flag onto an address kind.
    #[must_use]
    pub const fn from_private(private: bool) -> Self {
        if private {
            Self::Private
        } else {
            Self::Public
        }
    }
}

/// One relation/href pair from a resource's link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name, e.g. `self` or `current_instance`.
    pub rel: String,
    /// Server-relative resource path.
    pub href: String,
}

/// Ordered link table attached to API resource representations.
///
/// Relations are not unique in general; lookups return the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTable(pub Vec<Link>);

impl LinkTable {
    /// Find the href of the first link with the given relation.
    #[must_use]
    pub fn find(&self, rel: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|link| link.rel == rel)
            .map(|link| link.href.as_str())
    }
}

/// An instance as returned by the modern API generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Link table; every representation is expected to carry a `self` link.
    #[serde(default)]
    pub links: LinkTable,
    /// Public IP addresses, in interface order.
    #[serde(default)]
    pub public_ip_addresses: Vec<String>,
    /// Private IP addresses, in interface order.
    #[serde(default)]
    pub private_ip_addresses: Vec<String>,
    /// Instance name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Instance state (pending, operational, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Initial Administrator password; only present in the sensitive view,
    /// and only once the cloud has generated it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

impl Instance {
    /// The address list for the selected family.
    #[must_use]
    pub fn addresses(&self, kind: AddressKind) -> &[String] {
        match kind {
            AddressKind::Public => &self.public_ip_addresses,
            AddressKind::Private => &self.private_ip_addresses,
        }
    }
}

/// A logical server as returned by the modern API generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Link table; `current_instance` and `next_instance` live here.
    #[serde(default)]
    pub links: LinkTable,
    /// Server name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// A server array as returned by the modern API generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerArray {
    /// Link table; `current_instances` lives here.
    #[serde(default)]
    pub links: LinkTable,
    /// Array name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A collection entry from the legacy API generation.
///
/// The legacy generation keys instances by numeric legacy id and reports
/// the modern href alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyInstance {
    /// Modern server-relative resource path for this instance.
    pub href: String,
    /// Numeric identifier from the legacy generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<u64>,
    /// Cloud-assigned resource uid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_uid: Option<String>,
}
