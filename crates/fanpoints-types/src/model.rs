//! Status and role enums shared by the service and its clients.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Fan,
    Creator,
    Admin,
}

impl Role {
    pub fn can_manage_campaigns(self) -> bool {
        matches!(self, Role::Creator | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FAN" => Ok(Role::Fan),
            "CREATOR" => Ok(Role::Creator),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(ParseError::Role(s.to_string())),
        }
    }
}

/// Lifecycle of a listening session.
///
/// `Started` → `InProgress` (first heartbeat) → `Rewarded` (settlement).
/// Sessions that are never completed simply stay where they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Started,
    InProgress,
    Rewarded,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self == SessionStatus::Rewarded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    #[default]
    Active,
    Paused,
    Ended,
}

impl FromStr for CampaignStatus {
    type Err = ParseError;

    /// Exact, case-sensitive match on the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CampaignStatus::Active),
            "PAUSED" => Ok(CampaignStatus::Paused),
            "ENDED" => Ok(CampaignStatus::Ended),
            _ => Err(ParseError::CampaignStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    /// Paid out for a qualifying listening session. Counts toward the daily cap.
    Reward,
    /// Promotional credit. Counts toward the balance only.
    Bonus,
}
