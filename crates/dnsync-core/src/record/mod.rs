//! DNS record model
//!
//! [`Record`] is the caller-facing representation: a closed set of record
//! kinds plus a [`Generic`] fallback for everything else. Every kind except
//! `Generic` carries an optional identity token issued by the remote service;
//! the token is the only reliable way to address a persisted record.
//!
//! [`RemoteRecord`] is the provider's wire representation, produced and
//! consumed by a [`RecordCodec`](crate::traits::RecordCodec).

mod remote;

pub use remote::{ListRecordsResponse, RemoteRecord};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Separator used when rendering a [`ReconciliationKey`]
pub const KEY_SEPARATOR: char = '|';

/// A or AAAA record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub ttl: Duration,
    pub ip: IpAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cname {
    pub name: String,
    pub ttl: Duration,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Txt {
    pub name: String,
    pub ttl: Duration,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mx {
    pub name: String,
    pub ttl: Duration,
    pub preference: u16,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Srv {
    pub name: String,
    pub ttl: Duration,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// Which RR type a [`ServiceBinding`] is published as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindingScheme {
    #[default]
    Https,
    Svcb,
}

/// HTTPS or SVCB record
///
/// SvcParams are kept in their presentation form (`alpn=h2,h3 ech=...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub name: String,
    pub ttl: Duration,
    #[serde(default)]
    pub scheme: BindingScheme,
    pub priority: u16,
    pub target: String,
    #[serde(default)]
    pub params: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// Fallback for record types without a dedicated kind
///
/// Generic records have nowhere to keep an identity token, so they can only
/// be correlated with remote records by [`ReconciliationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generic {
    pub name: String,
    pub ttl: Duration,
    pub rtype: String,
    pub data: String,
}

/// A DNS record as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Address(Address),
    Cname(Cname),
    Txt(Txt),
    Mx(Mx),
    Srv(Srv),
    ServiceBinding(ServiceBinding),
    Generic(Generic),
}

impl Record {
    /// Record name, absolute or zone-relative as supplied
    pub fn name(&self) -> &str {
        match self {
            Record::Address(r) => &r.name,
            Record::Cname(r) => &r.name,
            Record::Txt(r) => &r.name,
            Record::Mx(r) => &r.name,
            Record::Srv(r) => &r.name,
            Record::ServiceBinding(r) => &r.name,
            Record::Generic(r) => &r.name,
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Record::Address(r) => r.ttl,
            Record::Cname(r) => r.ttl,
            Record::Txt(r) => r.ttl,
            Record::Mx(r) => r.ttl,
            Record::Srv(r) => r.ttl,
            Record::ServiceBinding(r) => r.ttl,
            Record::Generic(r) => r.ttl,
        }
    }

    /// DNS type mnemonic
    ///
    /// Addresses are `AAAA` for any IPv6 address, IPv4-mapped ones included.
    pub fn record_type(&self) -> &str {
        match self {
            Record::Address(r) if r.ip.is_ipv6() => "AAAA",
            Record::Address(_) => "A",
            Record::Cname(_) => "CNAME",
            Record::Txt(_) => "TXT",
            Record::Mx(_) => "MX",
            Record::Srv(_) => "SRV",
            Record::ServiceBinding(r) => match r.scheme {
                BindingScheme::Https => "HTTPS",
                BindingScheme::Svcb => "SVCB",
            },
            Record::Generic(r) => &r.rtype,
        }
    }

    /// Identity token issued by the remote service
    ///
    /// `None` when the record was never persisted, when the token is empty,
    /// and always for [`Generic`] records.
    pub fn identity(&self) -> Option<&str> {
        let identity = match self {
            Record::Address(r) => r.identity.as_deref(),
            Record::Cname(r) => r.identity.as_deref(),
            Record::Txt(r) => r.identity.as_deref(),
            Record::Mx(r) => r.identity.as_deref(),
            Record::Srv(r) => r.identity.as_deref(),
            Record::ServiceBinding(r) => r.identity.as_deref(),
            Record::Generic(_) => None,
        };
        identity.filter(|id| !id.is_empty())
    }

    /// Return a copy carrying `identity`
    ///
    /// Generic records are returned unchanged.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        let identity = Some(identity.into());
        match &mut self {
            Record::Address(r) => r.identity = identity,
            Record::Cname(r) => r.identity = identity,
            Record::Txt(r) => r.identity = identity,
            Record::Mx(r) => r.identity = identity,
            Record::Srv(r) => r.identity = identity,
            Record::ServiceBinding(r) => r.identity = identity,
            Record::Generic(_) => {}
        }
        self
    }

    /// Key used to correlate this record with a listed remote record
    pub fn reconciliation_key(&self, zone: &str) -> ReconciliationKey {
        ReconciliationKey::new(relative_name(self.name(), zone), self.record_type())
    }
}

/// Derived (relative name, type) pair
///
/// Only meaningful inside a single reconciliation call: the remote service
/// may hold several records with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReconciliationKey {
    pub name: String,
    pub rtype: String,
}

impl ReconciliationKey {
    pub fn new(name: impl Into<String>, rtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rtype: rtype.into(),
        }
    }
}

impl fmt::Display for ReconciliationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, KEY_SEPARATOR, self.rtype)
    }
}

/// Whether `token` can be an identity rather than a rendered key
pub fn is_record_id(token: &str) -> bool {
    !token.is_empty() && !token.contains(KEY_SEPARATOR)
}

/// Express `name` relative to `zone`
///
/// Trailing dots on either side are ignored. The zone apex becomes `@`;
/// names outside the zone, and names that are already relative, are
/// returned without their trailing dot.
pub fn relative_name(name: &str, zone: &str) -> String {
    let name = name.trim_end_matches('.');
    let zone = zone.trim_end_matches('.');
    if zone.is_empty() {
        return name.to_string();
    }
    if name.eq_ignore_ascii_case(zone) {
        return "@".to_string();
    }
    if name.len() > zone.len() + 1 {
        let split = name.len() - zone.len();
        if let (Some(head), Some(tail)) = (name.get(..split), name.get(split..))
            && tail.eq_ignore_ascii_case(zone)
            && head.ends_with('.')
        {
            return head.trim_end_matches('.').to_string();
        }
    }
    name.to_string()
}

/// Strip a single trailing dot from a zone name
pub fn normalize_zone(zone: &str) -> &str {
    zone.strip_suffix('.').unwrap_or(zone)
}
