//! [`SteamSource`]: the production [`UpstreamSource`].
//!
//! Workshop mods map to a single workshop lookup. Games take two calls: the
//! store lookup decides whether the game still exists, and only then is the
//! news feed consulted for a timestamp. All adapters share one
//! `reqwest::Client` so connections are pooled and every call carries the
//! same request timeout.

use std::time::Duration;

use steamwatch_types::ItemKind;
use tracing::debug;

use crate::app_details::{AppDetailsAdapter, AppStatus};
use crate::error::UpstreamError;
use crate::news::NewsAdapter;
use crate::workshop::WorkshopAdapter;
use crate::{Description, Lookup, UpstreamSource};

/// Connection settings for the Steam endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamClientConfig {
    /// Steam Web API base URL (e.g. `https://api.steampowered.com`).
    pub web_api_url: String,
    /// Steam store API base URL (e.g. `https://store.steampowered.com/api`).
    pub store_api_url: String,
    /// Optional Steam Web API key, sent where the endpoint accepts one.
    pub api_key: Option<String>,
    /// Deadline for each individual HTTP call.
    pub request_timeout: Duration,
}

impl Default for SteamClientConfig {
    fn default() -> Self {
        Self {
            web_api_url: String::from("https://api.steampowered.com"),
            store_api_url: String::from("https://store.steampowered.com/api"),
            api_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Upstream source backed by the public Steam APIs.
#[derive(Debug, Clone)]
pub struct SteamSource {
    workshop: WorkshopAdapter,
    app_details: AppDetailsAdapter,
    news: NewsAdapter,
}

impl SteamSource {
    /// Build the shared HTTP client and all three adapters.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Setup`] if the HTTP client cannot be built.
    pub fn new(config: &SteamClientConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("steamwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Setup(e.to_string()))?;

        Ok(Self {
            workshop: WorkshopAdapter::new(client.clone(), &config.web_api_url),
            app_details: AppDetailsAdapter::new(client.clone(), &config.store_api_url),
            news: NewsAdapter::new(client, &config.web_api_url, config.api_key.clone()),
        })
    }

    async fn fetch_game(&self, id: &str) -> Result<Lookup, UpstreamError> {
        match self.app_details.fetch(id).await? {
            AppStatus::Unavailable => Ok(Lookup::NotFound),
            AppStatus::Available { .. } => self.news.fetch(id).await,
        }
    }
}

impl UpstreamSource for SteamSource {
    async fn fetch(&self, kind: ItemKind, id: &str) -> Result<Lookup, UpstreamError> {
        match kind {
            ItemKind::WorkshopMod => self.workshop.fetch(id).await,
            ItemKind::Game => self.fetch_game(id).await,
        }
    }

    async fn describe(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> Result<Option<Description>, UpstreamError> {
        match kind {
            ItemKind::WorkshopMod => {
                Ok(Description::from_lookup(id, self.workshop.fetch(id).await?))
            }
            ItemKind::Game => {
                let AppStatus::Available { name } = self.app_details.fetch(id).await? else {
                    return Ok(None);
                };
                let update_timestamp = match self.news.fetch(id).await? {
                    Lookup::Found(state) => Some(state.update_timestamp),
                    Lookup::NoChange | Lookup::NotFound => None,
                };
                debug!(id, ?name, ?update_timestamp, "described game");
                Ok(Some(Description {
                    name: name.unwrap_or_else(|| id.to_owned()),
                    update_timestamp,
                }))
            }
        }
    }
}
