use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Settings key under which the host stores the identifier of the active wallet.
pub const WALLET_ID: &str = "wallet.id";

/// Flat key/value settings of a host profile, e.g. `wallet.id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings(HashMap<String, Value>);

impl Settings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value for `key` if it is a non-empty string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for Settings
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Settings(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The host's view of one tenant: its settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub settings: Settings,
}

impl Profile {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn with_wallet_id(wallet_id: impl Into<String>) -> Self {
        let wallet_id: String = wallet_id.into();

        Self::new(Settings::from_iter([(WALLET_ID, wallet_id)]))
    }

    pub fn wallet_id(&self) -> Option<&str> {
        self.settings.get_str(WALLET_ID)
    }
}
