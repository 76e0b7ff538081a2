//! API key lookup and storage

use keyring::Entry;

use super::error::AssistantError;

const SERVICE_NAME: &str = "handbook";
const API_KEY_ENTRY: &str = "anthropic-api-key";

/// Environment variable checked before the keyring
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Where a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Keyring,
}

/// Reads and writes the assistant API key
pub struct ApiKeyManager;

impl ApiKeyManager {
    /// Key from `ANTHROPIC_API_KEY`, falling back to the system keyring
    pub fn resolve() -> Result<(String, KeySource), AssistantError> {
        Self::resolve_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_with(env_key: Option<String>) -> Result<(String, KeySource), AssistantError> {
        match env_key.map(|key| key.trim().to_string()).filter(|key| !key.is_empty()) {
            Some(key) => Ok((key, KeySource::Environment)),
            None => Self::get_api_key().map(|key| (key, KeySource::Keyring)),
        }
    }

    /// Key stored in the system keyring
    pub fn get_api_key() -> Result<String, AssistantError> {
        Self::entry()?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => AssistantError::ApiKeyNotFound,
            _ => AssistantError::Keyring(e.to_string()),
        })
    }

    /// Validate and store a key in the system keyring
    pub fn set_api_key(key: &str) -> Result<(), AssistantError> {
        let key = key.trim();
        if !Self::validate_key_format(key) {
            return Err(AssistantError::InvalidApiKey);
        }
        Self::entry()?.set_password(key).map_err(|e| AssistantError::Keyring(e.to_string()))
    }

    pub fn delete_api_key() -> Result<(), AssistantError> {
        Self::entry()?.delete_credential().map_err(|e| AssistantError::Keyring(e.to_string()))
    }

    fn entry() -> Result<Entry, AssistantError> {
        Entry::new(SERVICE_NAME, API_KEY_ENTRY).map_err(|e| AssistantError::Keyring(e.to_string()))
    }

    fn validate_key_format(key: &str) -> bool {
        key.starts_with("sk-ant-") && key.len() > 20
    }

    /// Key with everything but the first 8 and last 4 characters hidden
    pub fn mask_key(key: &str) -> String {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }
}
