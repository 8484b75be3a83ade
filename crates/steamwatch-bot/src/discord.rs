//! Discord REST delivery.
//!
//! A destination is a guild id plus a channel id. The channel resolves when
//! Discord returns it and it still belongs to the same guild; a 403 or 404
//! means the bot lost access or the channel was deleted. Messages are plain
//! `content` posts.

use std::time::Duration;

use serde_json::{Value, json};
use steamwatch_core::{Delivery, DeliveryError};
use steamwatch_types::Destination;
use tracing::debug;

use crate::error::BotError;

/// Discord rejects message content longer than this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

/// Per-request deadline for Discord calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts notifications to Discord channels with a bot token.
#[derive(Debug, Clone)]
pub struct DiscordDelivery {
    client: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl DiscordDelivery {
    /// Build a client for `base_url` (e.g. `https://discord.com/api/v10`).
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Discord`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, bot_token: &str) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("DiscordBot (steamwatch, ", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .map_err(|e| BotError::Discord {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            authorization: format!("Bot {bot_token}"),
        })
    }

    fn channel_url(&self, destination: &Destination) -> String {
        channel_url(&self.base_url, destination)
    }
}

impl Delivery for DiscordDelivery {
    async fn resolve(&self, destination: &Destination) -> Result<bool, DeliveryError> {
        let response = self
            .client
            .get(self.channel_url(destination))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if is_gone(status) {
            debug!(%destination, status = status.as_u16(), "Channel not reachable");
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let channel: Value = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(format!("channel body is not JSON: {e}")))?;
        Ok(belongs_to_group(&channel, destination))
    }

    async fn deliver(&self, destination: &Destination, message: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/messages", self.channel_url(destination));
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(&json!({ "content": truncate_content(message) }))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if is_gone(status) {
            return Err(DeliveryError::Unresolvable(destination.clone()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn channel_url(base_url: &str, destination: &Destination) -> String {
    format!("{base_url}/channels/{}", destination.channel)
}

/// 403 and 404 both mean the bot can no longer post there.
fn is_gone(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::FORBIDDEN
}

/// Whether a channel object still sits in the destination's guild.
///
/// Channels without a `guild_id` (DMs) never match.
fn belongs_to_group(channel: &Value, destination: &Destination) -> bool {
    channel
        .get("guild_id")
        .and_then(Value::as_str)
        .is_some_and(|guild| guild == destination.group.as_str())
}

fn truncate_content(message: &str) -> &str {
    match message.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => message.get(..cut).unwrap_or(message),
        None => message,
    }
}
