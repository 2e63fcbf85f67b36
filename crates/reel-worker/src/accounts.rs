//! Built-in account profiles.

use reel_models::AccountProfile;

use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_ACCOUNT: &str = "anachronism";

const ANACHRONISM_THEME: &str = r#"Anachronism: modern technology dropped into historical settings.

The joke must land within half a second, with no thinking required.

Historical figures (instantly recognisable only): samurai in armour with katana, medieval knight in full plate, Roman legionary or gladiator, Egyptian pharaoh with gold headdress, caveman with fur and club, Viking with axe, Spartan with spear and crested helmet.

Modern devices everyone knows: smartphone with glowing screen, VR headset, buzzing drone, robot vacuum, car with gull-wing doors, wireless earbuds, laptop, electric scooter.

Reactions are big and physical: stumbling back in shock, dropping to the knees in awe, attacking the device, fleeing in terror, bowing to it like a god. Never subtle confusion.

Examples: a caveman flees a robot vacuum and hides behind a rock; a samurai squares off against a drone and slices at it; a Roman emperor tries VR and staggers back at a modern skyline; a pharaoh raises a phone flashlight like a divine relic.

Avoid obscure periods, small reactions and dialogue."#;

/// Accounts known to the CLI.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: Vec<AccountProfile>,
}

impl AccountRegistry {
    /// The built-in accounts, without destination profiles.
    pub fn builtin() -> Self {
        Self {
            accounts: vec![AccountProfile {
                id: DEFAULT_ACCOUNT.to_string(),
                name: "Anachronism (時代錯誤)".to_string(),
                theme: ANACHRONISM_THEME.to_string(),
                style: "cinematic vintage film aesthetic, warm lighting, shallow depth of field"
                    .to_string(),
                sheet_name: "prompts".to_string(),
                destination_profile_id: None,
            }],
        }
    }

    /// Built-in accounts with destination profiles from `LATER_PROFILE_ID_<ACCOUNT>`.
    pub fn from_env() -> Self {
        let mut registry = Self::builtin();
        for account in &mut registry.accounts {
            account.destination_profile_id = std::env::var(account.profile_env_var())
                .ok()
                .filter(|s| !s.is_empty());
        }
        registry
    }

    pub fn ids(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.id.clone()).collect()
    }

    pub fn accounts(&self) -> &[AccountProfile] {
        &self.accounts
    }

    pub fn get(&self, id: &str) -> WorkerResult<&AccountProfile> {
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| WorkerError::UnknownAccount {
                id: id.to_string(),
                available: self.ids(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_default_account() {
        let registry = AccountRegistry::builtin();
        let account = registry.get(DEFAULT_ACCOUNT).unwrap();

        assert_eq!(account.sheet_name, "prompts");
        assert!(account.style.starts_with("cinematic vintage"));
        assert_eq!(account.profile_env_var(), "LATER_PROFILE_ID_ANACHRONISM");
    }

    #[test]
    fn test_unknown_account() {
        let err = AccountRegistry::builtin().get("cute_pets").unwrap_err();
        assert!(matches!(err, WorkerError::UnknownAccount { ref available, .. } if available == &["anachronism"]));
    }
}
