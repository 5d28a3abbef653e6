//! Session command records.
//!
//! The audit row every backend stores and counts.

use crate::core::{generate_id, now, OrgId, Timestamp};
use serde::{Deserialize, Serialize};

/// Risk level of a normal command.
pub const RISK_NORMAL: u8 = 0;
/// Risk level of a command matched by a danger rule.
pub const RISK_DANGEROUS: u8 = 5;

/// A command executed during a recorded session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Unique record ID
    pub id: String,
    /// Owning organization
    pub org_id: OrgId,
    /// Session the command ran in
    pub session: String,
    /// User display
    pub user: String,
    /// Asset display
    pub asset: String,
    /// Account (system user) display
    pub account: String,
    /// Command line entered
    pub input: String,
    /// Captured output (truncated)
    pub output: String,
    /// Risk level
    pub risk_level: u8,
    /// Execution time
    pub timestamp: Timestamp,
}

impl CommandRecord {
    /// Create a new command record.
    pub fn new(org_id: &str, session: &str, input: &str) -> Self {
        Self {
            id: generate_id(),
            org_id: OrgId::new(org_id),
            session: session.to_string(),
            user: String::new(),
            asset: String::new(),
            account: String::new(),
            input: input.to_string(),
            output: String::new(),
            risk_level: RISK_NORMAL,
            timestamp: now(),
        }
    }

    /// Set user.
    pub fn by_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    /// Set asset.
    pub fn on_asset(mut self, asset: &str) -> Self {
        self.asset = asset.to_string();
        self
    }

    /// Set account.
    pub fn as_account(mut self, account: &str) -> Self {
        self.account = account.to_string();
        self
    }

    /// Set output.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    /// Mark as dangerous.
    pub fn dangerous(mut self) -> Self {
        self.risk_level = RISK_DANGEROUS;
        self
    }

    /// Set timestamp.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Object key used by object-store backends.
    pub fn object_key(&self) -> String {
        format!(
            "{}/{}/{}.json",
            self.timestamp.format("%Y-%m-%d"),
            self.session,
            self.id
        )
    }
}
