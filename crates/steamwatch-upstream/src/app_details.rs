//! Steam store application lookup.
//!
//! `appdetails?appids=<id>` answers with an object keyed by the id string.
//! Its `success` flag says whether the store still lists the application.

use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;
use crate::http::send_json;

/// Endpoint name used in errors and logs.
const ENDPOINT: &str = "appdetails";

/// Whether the store still lists an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStatus {
    /// Listed; `data.name` when present.
    Available {
        /// The store display name.
        name: Option<String>,
    },
    /// Not listed (`success` false or absent).
    Unavailable,
}

/// Looks up applications on the Steam store API.
#[derive(Debug, Clone)]
pub struct AppDetailsAdapter {
    client: reqwest::Client,
    url: String,
}

impl AppDetailsAdapter {
    /// Create an adapter rooted at the Steam store API base URL.
    pub fn new(client: reqwest::Client, store_api_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/appdetails", store_api_url.trim_end_matches('/')),
        }
    }

    /// Fetch the store status of application `id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails or the body has no
    /// entry for `id`.
    pub async fn fetch(&self, id: &str) -> Result<AppStatus, UpstreamError> {
        let request = self.client.get(&self.url).query(&[("appids", id)]);
        let json = send_json(ENDPOINT, request).await?;
        let status = extract_app_status(&json, id)?;
        debug!(id, ?status, "app details lookup");
        Ok(status)
    }
}

/// Interpret an `appdetails` response for `id`.
fn extract_app_status(json: &Value, id: &str) -> Result<AppStatus, UpstreamError> {
    let entry = json
        .get(id)
        .ok_or_else(|| UpstreamError::malformed(ENDPOINT, format!("no entry for app {id}")))?;

    let success = entry
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        return Ok(AppStatus::Unavailable);
    }

    let name = entry
        .get("data")
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);
    Ok(AppStatus::Available { name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_name() {
        let json = serde_json::json!({
            "730": {"success": true, "data": {"name": "Counter-Strike 2", "type": "game"}}
        });
        assert_eq!(
            extract_app_status(&json, "730"),
            Ok(AppStatus::Available {
                name: Some("Counter-Strike 2".to_owned())
            })
        );
    }

    #[test]
    fn false_or_absent_success_is_unavailable() {
        let delisted = serde_json::json!({"12": {"success": false}});
        assert_eq!(extract_app_status(&delisted, "12"), Ok(AppStatus::Unavailable));

        let bare = serde_json::json!({"12": {}});
        assert_eq!(extract_app_status(&bare, "12"), Ok(AppStatus::Unavailable));
    }

    #[test]
    fn missing_key_is_malformed() {
        // Steam answers `null` under rate limiting; that must not read as delisted.
        assert!(extract_app_status(&Value::Null, "12").is_err());
        let other = serde_json::json!({"13": {"success": true}});
        assert!(extract_app_status(&other, "12").is_err());
    }
}
