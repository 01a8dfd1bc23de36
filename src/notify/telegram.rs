use async_trait::async_trait;

use super::{DeliveryError, Notifier};

/// Telegram Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Maximum text length per Telegram message (platform limit).
const TELEGRAM_MAX_TEXT_LEN: usize = 4096;

/// Telegram Bot API notifier.
///
/// Sends plain-text messages to a single chat via the `sendMessage`
/// endpoint. The API base is injectable so tests can point it at a local
/// mock server.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String, api_base: String) -> Self {
        Self {
            bot_token,
            chat_id,
            api_base,
            client: reqwest::Client::new(),
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        tracing::info!("sending Telegram notification: '{text}'");

        for chunk in split_message(text, TELEGRAM_MAX_TEXT_LEN) {
            let body = serde_json::json!({
                "chat_id": self.chat_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(self.send_message_url())
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| DeliveryError(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let error_body = resp.text().await.unwrap_or_default();
                tracing::error!("Telegram send failed: {status} — {error_body}");
                return Err(DeliveryError(format!("Telegram API error: {status}")));
            }
        }

        Ok(())
    }
}

/// Split a message into chunks of at most `max_len` bytes, never cutting
/// through a UTF-8 character.
fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining);
            break;
        }
        // The byte limit may land inside a multi-byte character; walk back
        // to the nearest char boundary before slicing.
        let mut limit = max_len;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        // Try to split at a newline or space boundary
        let boundary = remaining[..limit]
            .rfind('\n')
            .or_else(|| remaining[..limit].rfind(' '))
            .unwrap_or(limit);
        // Prevent infinite loop when no boundary is found at position 0
        let boundary = if boundary == 0 { limit } else { boundary };
        let (chunk, rest) = remaining.split_at(boundary);
        chunks.push(chunk);
        remaining = rest.trim_start_matches(['\n', ' ']);
    }
    chunks
}
