//! Shared request plumbing for the Steam endpoints.

use crate::error::UpstreamError;

/// Send a prepared request and decode a 2xx JSON body.
///
/// Transport failures, non-success statuses, and undecodable bodies all map
/// to [`UpstreamError`]; none of them say anything about the item itself.
pub(crate) async fn send_json(
    endpoint: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|e| UpstreamError::from_reqwest(endpoint, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }

    response.json().await.map_err(|e| {
        if e.is_timeout() {
            UpstreamError::Timeout { endpoint }
        } else {
            UpstreamError::malformed(endpoint, format!("body is not JSON: {e}"))
        }
    })
}
