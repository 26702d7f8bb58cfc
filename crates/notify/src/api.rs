//! Minimal Bot API client: just the `sendMessage` call the notifier needs.

use {
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use crate::error::{Error, Result};

/// Response envelope returned by every Bot API method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<SentMessage>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The subset of the returned `Message` object we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// HTTP client for one bot token.
pub struct BotApi {
    client: Client,
    base: String,
    token: Secret<String>,
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApi")
            .field("base", &self.base)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl BotApi {
    /// Create a client for `token` against `base` (no trailing slash).
    #[must_use]
    pub fn new(base: impl Into<String>, token: Secret<String>) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
            token,
        }
    }

    /// Call `sendMessage` with the given chat, text, and `parse_mode`
    /// (empty string for plain text).
    ///
    /// A decoded `ok: false` envelope is returned as `Ok` — interpreting the
    /// rejection is the caller's business. `Err` means the call itself failed
    /// (network error, non-JSON body).
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: &str,
    ) -> Result<ApiResponse> {
        let url = format!("{}/bot{}/sendMessage", self.base, self.token.expose_secret());
        let params = [
            ("chat_id", chat_id),
            ("text", text),
            ("parse_mode", parse_mode),
        ];

        debug!(chat_id, text_len = text.chars().count(), parse_mode, "calling sendMessage");

        // Strip the URL from any reqwest error: its Display would embed
        // `/bot<token>/sendMessage`, and these errors end up in warn events
        // and the outcome log.
        let resp = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let envelope: ApiResponse = resp.json().await.map_err(|e| {
            Error::external("failed to decode sendMessage response", e.without_url())
        })?;
        Ok(envelope)
    }
}
