//! JSON snapshot persistence for crash recovery.

use super::records::{Account, Campaign, ListeningSession, RulesRecord, Track};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

const FORMAT_VERSION: u32 = 1;

/// Whole-store image. Collections are sorted by id so files diff cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub format_version: u32,
    pub accounts: Vec<Account>,
    pub sessions: Vec<ListeningSession>,
    pub campaigns: Vec<Campaign>,
    pub tracks: Vec<Track>,
    pub rules: Option<RulesRecord>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            accounts: Vec::new(),
            sessions: Vec::new(),
            campaigns: Vec::new(),
            tracks: Vec::new(),
            rules: None,
        }
    }
}

impl StoreSnapshot {
    pub(crate) fn sort(&mut self) {
        self.accounts.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        self.sessions.sort_by(|a, b| a.id.cmp(&b.id));
        self.campaigns.sort_by(|a, b| a.id.cmp(&b.id));
        self.tracks.sort_by(|a, b| a.id.cmp(&b.id));
    }

    /// Reject images that violate the ledger or budget invariants.
    pub fn check(&self) -> Result<(), Error> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::Storage(format!(
                "unsupported snapshot format {}",
                self.format_version
            )));
        }

        for account in &self.accounts {
            let total = account.ledger_total().ok_or_else(|| {
                Error::Storage(format!("ledger overflow for {}", account.user_id))
            })?;
            if total != account.balance() {
                return Err(Error::Storage(format!(
                    "balance {} != ledger total {} for {}",
                    account.balance(),
                    total,
                    account.user_id
                )));
            }
        }

        for campaign in &self.campaigns {
            if campaign.spent_points > campaign.budget_points {
                return Err(Error::Storage(format!(
                    "campaign {} overspent: {} > {}",
                    campaign.id, campaign.spent_points, campaign.budget_points
                )));
            }
        }

        let campaign_ids: HashSet<_> = self.campaigns.iter().map(|c| &c.id).collect();
        for track in &self.tracks {
            if !campaign_ids.contains(&track.campaign_id) {
                return Err(Error::Storage(format!(
                    "track {} references unknown campaign {}",
                    track.id, track.campaign_id
                )));
            }
        }

        Ok(())
    }
}

/// Snapshot file on disk.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| Error::Storage(format!("Failed to serialize snapshot: {e}")))?;

        // Atomic write: tmp + rename
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = tmp.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("Failed to create snapshot directory: {e}"))
            })?;
        }
        std::fs::write(&tmp, &json)
            .map_err(|e| Error::Storage(format!("Failed to write snapshot: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Storage(format!("Failed to rename snapshot: {e}")))?;

        info!(
            path = %self.path.display(),
            sessions = snapshot.sessions.len(),
            accounts = snapshot.accounts.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// `None` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<StoreSnapshot>, Error> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No snapshot found, starting fresh");
            return Ok(None);
        }

        let data = std::fs::read(&self.path)
            .map_err(|e| Error::Storage(format!("Failed to read snapshot: {e}")))?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&data)
            .map_err(|e| Error::Storage(format!("Failed to parse snapshot: {e}")))?;

        info!(
            path = %self.path.display(),
            sessions = snapshot.sessions.len(),
            accounts = snapshot.accounts.len(),
            "Snapshot loaded"
        );
        Ok(Some(snapshot))
    }
}
