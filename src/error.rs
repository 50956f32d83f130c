//! Error types for settings resolution.

/// Error reported by a deferred producer through its completion.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The requested environment has no entry in the config map.
    #[error("Environment settings were not found under \"{0}\"")]
    MissingEnvironment(String),

    /// A callback producer completed with an error.
    #[error("Deferred setting '{key}' failed: {source}")]
    Producer {
        key: String,
        #[source]
        source: ProducerError,
    },

    /// A callback producer dropped its completion without reporting.
    #[error("Deferred setting '{key}' was abandoned before completing")]
    Abandoned { key: String },

    #[error("Resolution was dropped before it completed")]
    Interrupted,

    /// A function or unresolved producer cannot be rendered as JSON.
    #[error("Setting '{key}' holds a {kind} and is not plain data")]
    NotPlainData { key: String, kind: &'static str },

    #[error("Invalid config map: {0}")]
    InvalidConfigMap(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SettingsError {
    /// Key of the setting that caused the error, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            SettingsError::Producer { key, .. }
            | SettingsError::Abandoned { key }
            | SettingsError::NotPlainData { key, .. } => Some(key),
            SettingsError::MissingEnvironment(_)
            | SettingsError::Interrupted
            | SettingsError::InvalidConfigMap(_)
            | SettingsError::Json(_) => None,
        }
    }
}
