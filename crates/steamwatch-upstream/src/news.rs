//! Most recent announcement for a Steam application.
//!
//! `ISteamNews/GetNewsForApp/v2/?appid=<id>&count=1` returns news newest
//! first. The first item's `date` is the comparison timestamp. A game with
//! no news at all is still a valid game, so an empty list is
//! [`Lookup::NoChange`].

use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;
use crate::http::send_json;
use crate::{ItemState, Lookup};

/// Endpoint name used in errors and logs.
const ENDPOINT: &str = "news";

/// Reads the latest news item for an application.
#[derive(Debug, Clone)]
pub struct NewsAdapter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl NewsAdapter {
    /// Create an adapter rooted at the Steam Web API base URL.
    pub fn new(client: reqwest::Client, web_api_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            url: format!(
                "{}/ISteamNews/GetNewsForApp/v2/",
                web_api_url.trim_end_matches('/')
            ),
            api_key,
        }
    }

    /// Fetch the newest announcement timestamp for application `id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails or the body lacks
    /// `appnews.newsitems`.
    pub async fn fetch(&self, id: &str) -> Result<Lookup, UpstreamError> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("appid", id), ("count", "1")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let json = send_json(ENDPOINT, request).await?;
        let lookup = extract_latest_news(&json)?;
        debug!(id, ?lookup, "news lookup");
        Ok(lookup)
    }
}

/// Interpret a `GetNewsForApp` response.
fn extract_latest_news(json: &Value) -> Result<Lookup, UpstreamError> {
    let items = json
        .get("appnews")
        .and_then(|n| n.get("newsitems"))
        .and_then(Value::as_array)
        .ok_or_else(|| UpstreamError::malformed(ENDPOINT, "missing appnews.newsitems"))?;

    let Some(newest) = items.first() else {
        return Ok(Lookup::NoChange);
    };

    let update_timestamp = newest
        .get("date")
        .and_then(Value::as_i64)
        .ok_or_else(|| UpstreamError::malformed(ENDPOINT, "news item without date"))?;

    Ok(Lookup::Found(ItemState {
        update_timestamp,
        title: None,
    }))
}
