use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default Bot API host.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Outcome-log settings, read once per dispatch call and never mutated by
/// the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Append one line per sent segment to the log file.
    pub enabled: bool,
    /// Also append the segment's raw text as an extra line.
    pub full_text: bool,
    /// Log file path.
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            full_text: false,
            path: PathBuf::from("telegram.log"),
        }
    }
}

/// Configuration for the notifier. Supplied by the host and passed explicitly
/// into [`crate::BotApi`] / [`crate::Dispatcher`] construction; the pipeline
/// performs no ambient config lookups.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Bot API base URL (no trailing slash).
    pub api_base: String,

    /// Outcome logging.
    pub log: LogConfig,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("log", &self.log)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            api_base: DEFAULT_API_BASE.to_owned(),
            log: LogConfig::default(),
        }
    }
}
