//! Client fingerprint hashing. Raw values are never stored.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Raw client hints as seen at the edge.
#[derive(Debug, Clone, Default)]
pub struct ClientFingerprint {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub device_hint: Option<String>,
}

/// SHA-256 (hex) of each present hint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintHashes {
    pub ip_hash: Option<String>,
    pub user_agent_hash: Option<String>,
    pub device_hash: Option<String>,
}

impl ClientFingerprint {
    pub fn hash(&self) -> FingerprintHashes {
        FingerprintHashes {
            ip_hash: self.ip.as_deref().and_then(hash_fingerprint_part),
            user_agent_hash: self.user_agent.as_deref().and_then(hash_fingerprint_part),
            device_hash: self.device_hint.as_deref().and_then(hash_fingerprint_part),
        }
    }
}

/// Hex SHA-256 of a trimmed hint; `None` for blank input.
pub fn hash_fingerprint_part(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(hex::encode(Sha256::digest(trimmed.as_bytes())))
}
