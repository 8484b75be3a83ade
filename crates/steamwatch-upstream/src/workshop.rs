//! Steam Workshop item lookup.
//!
//! Calls `ISteamRemoteStorage/GetPublishedFileDetails/v1/` with a single
//! item. The response carries a per-item `result` code: `1` means the item
//! exists, anything else means Steam no longer serves it.

use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;
use crate::http::send_json;
use crate::{ItemState, Lookup};

/// Endpoint name used in errors and logs.
const ENDPOINT: &str = "workshop";

/// Steam's `EResult::OK`.
const RESULT_OK: i64 = 1;

/// Looks up one published file at a time.
#[derive(Debug, Clone)]
pub struct WorkshopAdapter {
    client: reqwest::Client,
    url: String,
}

impl WorkshopAdapter {
    /// Create an adapter rooted at the Steam Web API base URL.
    pub fn new(client: reqwest::Client, web_api_url: &str) -> Self {
        Self {
            client,
            url: format!(
                "{}/ISteamRemoteStorage/GetPublishedFileDetails/v1/",
                web_api_url.trim_end_matches('/')
            ),
        }
    }

    /// Fetch the current state of workshop item `id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails or the payload lacks
    /// `response.publishedfiledetails[0].result`.
    pub async fn fetch(&self, id: &str) -> Result<Lookup, UpstreamError> {
        let request = self
            .client
            .post(&self.url)
            .form(&[("itemcount", "1"), ("publishedfileids[0]", id)]);

        let json = send_json(ENDPOINT, request).await?;
        let lookup = extract_workshop_lookup(&json)?;
        debug!(id, ?lookup, "workshop lookup");
        Ok(lookup)
    }
}

/// Interpret a `GetPublishedFileDetails` response for a single item.
fn extract_workshop_lookup(json: &Value) -> Result<Lookup, UpstreamError> {
    let details = json
        .get("response")
        .and_then(|r| r.get("publishedfiledetails"))
        .and_then(|d| d.get(0))
        .ok_or_else(|| {
            UpstreamError::malformed(ENDPOINT, "missing response.publishedfiledetails[0]")
        })?;

    let result = details
        .get("result")
        .and_then(Value::as_i64)
        .ok_or_else(|| UpstreamError::malformed(ENDPOINT, "missing result code"))?;

    if result != RESULT_OK {
        return Ok(Lookup::NotFound);
    }

    let update_timestamp = details
        .get("time_updated")
        .and_then(Value::as_i64)
        .ok_or_else(|| UpstreamError::malformed(ENDPOINT, "missing time_updated"))?;

    let title = details
        .get("title")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    Ok(Lookup::Found(ItemState {
        update_timestamp,
        title,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_item_yields_timestamp_and_title() {
        let json = serde_json::json!({
            "response": {
                "result": 1,
                "resultcount": 1,
                "publishedfiledetails": [{
                    "publishedfileid": "42",
                    "result": 1,
                    "title": "Ace Mod",
                    "time_updated": 1_700_000_150
                }]
            }
        });
        let lookup = extract_workshop_lookup(&json);
        assert_eq!(
            lookup,
            Ok(Lookup::Found(ItemState {
                update_timestamp: 1_700_000_150,
                title: Some("Ace Mod".to_owned()),
            }))
        );
    }

    #[test]
    fn non_ok_result_code_means_not_found() {
        let json = serde_json::json!({
            "response": {
                "publishedfiledetails": [{"publishedfileid": "7", "result": 9}]
            }
        });
        assert_eq!(extract_workshop_lookup(&json), Ok(Lookup::NotFound));
    }

    #[test]
    fn empty_details_is_malformed_not_missing() {
        let json = serde_json::json!({"response": {"publishedfiledetails": []}});
        assert!(matches!(
            extract_workshop_lookup(&json),
            Err(UpstreamError::Malformed { .. })
        ));
    }

    #[test]
    fn found_without_timestamp_is_malformed() {
        let json = serde_json::json!({
            "response": {"publishedfiledetails": [{"result": 1, "title": "x"}]}
        });
        assert!(extract_workshop_lookup(&json).is_err());
    }

    #[test]
    fn url_is_built_from_base() {
        let adapter = WorkshopAdapter::new(reqwest::Client::new(), "https://example.test/");
        assert_eq!(
            adapter.url,
            "https://example.test/ISteamRemoteStorage/GetPublishedFileDetails/v1/"
        );
    }
}
