//! Shared plumbing for the APS REST clients.

use crate::utils::error::{Result, ViewerError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://developer.api.autodesk.com";

/// Unreserved characters (RFC 3986) stay as-is inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("aps-simple-viewer/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// 組合 base url 與 API 路徑，容許 base url 結尾帶 `/`
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// 非 2xx 回應轉成 [`ViewerError::ApiError`]，保留 APS 回傳的錯誤內容
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("APS responded {}: {}", status, body);
    let message = if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body
    };
    Err(ViewerError::api(status.as_u16(), message))
}

pub async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ViewerError::ResponseFormatError {
        message: format!("failed to parse APS response: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        assert_eq!(
            endpoint("https://developer.api.autodesk.com/", "/oss/v2/buckets"),
            "https://developer.api.autodesk.com/oss/v2/buckets"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:9000", "authentication/v2/token"),
            "http://127.0.0.1:9000/authentication/v2/token"
        );
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("house.rvt"), "house.rvt");
        assert_eq!(encode_segment("my model.zip"), "my%20model.zip");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
    }
}
