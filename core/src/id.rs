use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Prefix marking a client-synthesized identifier.
pub const PROVISIONAL_PREFIX: &str = "temp-";

/// Identifier of a record. Server-issued ids are opaque strings; client-synthesized ones
/// carry [`PROVISIONAL_PREFIX`] followed by a ULID (millisecond timestamp plus random bits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    /// Fresh provisional id using the default prefix.
    pub fn provisional() -> Self { Self::provisional_with_prefix(PROVISIONAL_PREFIX) }

    pub fn provisional_with_prefix(prefix: &str) -> Self { Self(format!("{prefix}{}", Ulid::new())) }

    /// Server-style id, as handed out by a gateway on create.
    pub fn issued() -> Self { Self(Ulid::new().to_string().to_lowercase()) }

    pub fn is_provisional(&self) -> bool { self.has_prefix(PROVISIONAL_PREFIX) }

    pub fn has_prefix(&self, prefix: &str) -> bool { !prefix.is_empty() && self.0.starts_with(prefix) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self { Self(id) }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl PartialEq<str> for RecordId {
    fn eq(&self, other: &str) -> bool { self.0 == other }
}

impl PartialEq<&str> for RecordId {
    fn eq(&self, other: &&str) -> bool { self.0 == *other }
}
