//! Remote image fetching
//!
//! Branch logos live on external hosts. Documents embed them and browsers load
//! them through `/api/proxy/image` to avoid cross-origin restrictions.

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("cipa-server/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT_SECS: u64 = 10;

/// Largest image the proxy will relay
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Upstream content is not an image: {0}")]
    NotAnImage(String),

    #[error("Image exceeds {0} bytes")]
    TooLarge(usize),
}

/// Downloaded image
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct ImageProxy {
    client: reqwest::Client,
}

impl ImageProxy {
    pub fn new() -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProxyError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// Only absolute http(s) URLs are fetched
    pub fn validate_url(url: &str) -> Result<reqwest::Url, ProxyError> {
        let parsed = reqwest::Url::parse(url.trim()).map_err(|e| ProxyError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(ProxyError::InvalidUrl(format!("unsupported scheme {}", other))),
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, ProxyError> {
        let url = Self::validate_url(url)?;
        debug!("Fetching image {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProxyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProxyError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ProxyError::NotAnImage(content_type));
        }
        if response
            .content_length()
            .is_some_and(|len| len as usize > MAX_IMAGE_BYTES)
        {
            return Err(ProxyError::TooLarge(MAX_IMAGE_BYTES));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Network(e.to_string()))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ProxyError::TooLarge(MAX_IMAGE_BYTES));
        }

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_schemes() {
        assert!(ImageProxy::validate_url("https://cdn.example.com/logo.png").is_ok());
        assert!(ImageProxy::validate_url("http://10.0.0.5/logo.jpg").is_ok());
        assert!(matches!(
            ImageProxy::validate_url("file:///etc/passwd"),
            Err(ProxyError::InvalidUrl(_))
        ));
        assert!(ImageProxy::validate_url("not a url").is_err());
    }
}
