//! Signing protocol selection per target network
//!
//! The chain changed its message and transaction encoding across a network
//! migration. Networks that predate it keep the legacy encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Networks still running the legacy encoding
pub const LEGACY_NETWORKS: &[&str] = &["test3"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    Current,
    Legacy,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::Current => f.write_str("current"),
            ProtocolVersion::Legacy => f.write_str("legacy"),
        }
    }
}

/// Pick the protocol a signing or transaction-building operation must use on `chain_id`
pub fn select_protocol(chain_id: &str) -> ProtocolVersion {
    if LEGACY_NETWORKS.contains(&chain_id) {
        ProtocolVersion::Legacy
    } else {
        ProtocolVersion::Current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_networks() {
        assert_eq!(select_protocol("test3"), ProtocolVersion::Legacy);
    }

    #[test]
    fn test_everything_else_is_current() {
        for chain_id in ["main", "test4", "test5", "portal-loop", "dev", "", "TEST3", "test3 "] {
            assert_eq!(select_protocol(chain_id), ProtocolVersion::Current, "{:?}", chain_id);
        }
    }
}
