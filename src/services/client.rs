// src/services/client.rs

//! Signed request client for the marketplace API.
//!
//! Every call carries a `Timestamp` header (unix seconds) and an
//! `X-Signature` header holding
//! `base64(HMAC-SHA256(key, METHOD|path|timestamp|))`, where `path` is the
//! endpoint URL with the API host prefix removed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use crate::error::{AppError, Result};
use crate::models::ApiConfig;
use crate::utils::http::{create_async_client, is_success};
use crate::utils::strip_host;

type HmacSha256 = Hmac<Sha256>;

/// Compute the request signature.
pub fn sign(key: &[u8], method: &str, path: &str, timestamp: &str) -> Result<String> {
    let message = format!("{}|{}|{}|", method.to_uppercase(), path, timestamp);
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::config(format!("invalid signing key: {e}")))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// A decoded response together with its headers.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub body: T,
    pub headers: HeaderMap,
}

/// HTTP client that signs every outbound request.
pub struct SignedClient {
    config: ApiConfig,
    client: Client,
}

impl SignedClient {
    /// Create a new signed client with the given API settings.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = create_async_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Issue a signed GET against `url` with an already encoded query string.
    ///
    /// No retries: transport failures, non-2xx statuses and undecodable
    /// bodies are returned to the caller as-is.
    pub async fn call<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &str,
    ) -> Result<ApiResponse<T>> {
        let timestamp = Utc::now().timestamp().to_string();
        let path = strip_host(url, &self.config.api_host);
        let signature = sign(self.config.signing_key.as_bytes(), "get", path, &timestamp)?;

        let full_url = if params.is_empty() {
            url.to_string()
        } else {
            format!("{url}?{params}")
        };

        let response = self
            .client
            .get(&full_url)
            .header("Timestamp", &timestamp)
            .header("X-Signature", signature)
            .send()
            .await
            .inspect_err(|e| log::error!("Failed http request to {}: {}", url, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await?;
        log::debug!("HTTP GET {} -> {}", full_url, status);

        if !is_success(status) {
            log::error!(
                "Bad http status {} from {} (params: {}): {}",
                status,
                url,
                params,
                text
            );
            return Err(AppError::http_status(status, text));
        }

        let body = decode_body(url, &text)?;
        Ok(ApiResponse { body, headers })
    }
}

/// Decode a JSON response body, logging the raw body on failure.
pub fn decode_body<T: DeserializeOwned>(url: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        log::error!("Bad json body from {}: {} ({})", url, text, e);
        AppError::from(e)
    })
}
