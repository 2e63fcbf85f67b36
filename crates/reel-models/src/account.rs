//! Account profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Static per-account configuration, selected once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AccountProfile {
    /// Short key used on the command line and in file names
    pub id: String,
    /// Display name
    pub name: String,
    /// Theme brief handed to the prompt generator
    pub theme: String,
    /// Visual style hint
    pub style: String,
    /// Ledger sheet holding this account's rows
    pub sheet_name: String,
    /// Destination profile on the social scheduler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_profile_id: Option<String>,
}

impl AccountProfile {
    /// Env var consulted for the destination profile, e.g. `LATER_PROFILE_ID_ANACHRONISM`.
    pub fn profile_env_var(&self) -> String {
        format!("LATER_PROFILE_ID_{}", self.id.to_uppercase())
    }
}
