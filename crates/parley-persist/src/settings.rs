use parley_llm::ProviderKind;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ProviderSettings, SettingName};
use crate::store::KeyValueStore;

/// Per-provider settings kept in a hash under `{provider}_settings`
///
/// Defaults are written back the first time an unset setting is read.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(kind: ProviderKind) -> String {
        format!("{}_settings", kind.as_str())
    }

    /// Current value, falling back to (and storing) the default
    pub async fn get_setting(&self, kind: ProviderKind, name: SettingName) -> Result<String> {
        let key = Self::key(kind);
        if let Some(value) = self.store.hash_get(&key, name.as_str()).await? {
            return Ok(value);
        }

        let default = ProviderSettings::default_value(kind, name);
        self.store.hash_set(&key, name.as_str(), default.clone()).await?;
        Ok(default)
    }

    /// Validate and store a value, returning the canonical form
    pub async fn set_setting(&self, kind: ProviderKind, name: SettingName, raw: &str) -> Result<String> {
        let value = name.validate(kind, raw)?;
        self.store
            .hash_set(&Self::key(kind), name.as_str(), value.clone())
            .await?;

        tracing::info!(provider = %kind, setting = %name, value = %value, "Setting updated");
        Ok(value)
    }

    /// Remove a stored value so the default applies again
    pub async fn reset_setting(&self, kind: ProviderKind, name: SettingName) -> Result<String> {
        self.store.hash_delete(&Self::key(kind), name.as_str()).await?;
        tracing::info!(provider = %kind, setting = %name, "Setting reset to default");
        Ok(ProviderSettings::default_value(kind, name))
    }

    /// Snapshot of every setting for one turn
    pub async fn load(&self, kind: ProviderKind) -> Result<ProviderSettings> {
        let raw = self.store.hash_get_all(&Self::key(kind)).await?;
        Ok(ProviderSettings::from_map(kind, &raw))
    }
}
