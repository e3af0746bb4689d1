/// Core identity and bucket types.
use std::fmt;
use std::str::FromStr;

use crate::error::LatticeError;

/// Ledger bucket holding per-peer heartbeat timestamps.
pub const HEALTHCHECK_BUCKET: &str = "healthcheck";

/// Ledger bucket mapping service names to their owning peers.
pub const SERVICES_BUCKET: &str = "services";

/// Ledger bucket holding access-grant records keyed by peer identity.
pub const USERS_BUCKET: &str = "users";

/// Opaque, globally unique identity of a network participant.
///
/// Derived from the transport-layer identity and immutable for the
/// process lifetime. Displayed and parsed as its string form; the
/// total order over peer ids drives leader election.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(String);

impl PeerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = if self.0.len() > 12 {
            &self.0[..12]
        } else {
            &self.0
        };
        write!(f, "PeerId({short}...)")
    }
}

impl FromStr for PeerId {
    type Err = LatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LatticeError::InvalidPeerId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl serde::Serialize for PeerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PeerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
