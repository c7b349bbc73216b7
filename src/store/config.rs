use serde::Deserialize;

/// Settings for a [`GlobalStore`](super::GlobalStore).
///
/// Deserializable with every field optional, so it can sit inside a host
/// application's own configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name used in log records and in `StoreTerminated` errors.
    pub name: String,
    /// Include written values in the per-send debug log.
    pub log_values: bool,
}

impl StoreConfig {
    /// Set the store name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Turn value logging on or off.
    pub fn with_log_values(mut self, log_values: bool) -> Self {
        self.log_values = log_values;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "GlobalStore".to_string(),
            log_values: false,
        }
    }
}
