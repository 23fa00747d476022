use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::binance::types::ApiErrorBody;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

const MAX_BODY_IN_ERROR: usize = 256;

/// Blocking client for the Binance public market-data endpoints.
///
/// Holds nothing but the validated config and the HTTP client, so a shared
/// reference can be used from several threads at once.
#[derive(Debug, Clone)]
pub struct ExchangeSnapshotClient {
    http: Client,
    config: ClientConfig,
}

/// Decoded body of a successful response.
#[derive(Debug)]
pub(crate) struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ExchangeSnapshotClient {
    pub fn new(symbol: &str, depth_levels: Option<u32>) -> Result<Self> {
        let mut config = ClientConfig::new(symbol);
        if let Some(depth_levels) = depth_levels {
            config = config.depth_levels(depth_levels);
        }
        Self::with_config(config)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let config = config.normalized()?;

        // reqwest's blocking client defaults to a 30s timeout, we only want one if asked for
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            symbol = %config.symbol,
            depth_levels = config.depth_levels,
            base_url = %config.base_url,
            "Created exchange client"
        );

        Ok(Self { http, config })
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn depth_levels(&self) -> u32 {
        self.config.depth_levels
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Every request goes through here: GET `base_url + path` with `params`,
    /// fail on transport errors and non-2xx statuses, decode the body as JSON.
    pub(crate) fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        let url = format!("{}{}", self.config.base_url, path);
        let query = encode_params(params);

        tracing::debug!(%url, %query, "GET");

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .map_err(|e| transport_error(path, &query, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = describe_error_body(&body);
            tracing::warn!(
                endpoint = path,
                %query,
                status = status.as_u16(),
                %message,
                "Exchange returned an error status"
            );
            return Err(Error::ExchangeRequest {
                endpoint: path.to_string(),
                params: query,
                status: Some(status.as_u16()),
                timed_out: false,
                message,
                source: None,
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| transport_error(path, &query, e))?;

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(endpoint = path, %query, error = %e, "Response body is not JSON");
            Error::ExchangeRequest {
                endpoint: path.to_string(),
                params: query.clone(),
                status: Some(status.as_u16()),
                timed_out: false,
                message: format!("response body is not valid JSON: {}", truncate(&String::from_utf8_lossy(&bytes))),
                source: Some(Box::new(e)),
            }
        })?;

        // binance can answer 200 with an error payload
        if let Some(api) = api_error(&body) {
            let message = format!("Binance API error {}: {}", api.code, api.msg);
            tracing::warn!(endpoint = path, %query, status = status.as_u16(), %message, "Exchange returned an error body");
            return Err(Error::ExchangeRequest {
                endpoint: path.to_string(),
                params: query,
                status: Some(status.as_u16()),
                timed_out: false,
                message,
                source: None,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

pub(crate) fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn transport_error(path: &str, query: &str, e: reqwest::Error) -> Error {
    let timed_out = e.is_timeout();
    tracing::warn!(endpoint = path, %query, timed_out, error = %e, "Request failed");
    Error::ExchangeRequest {
        endpoint: path.to_string(),
        params: query.to_string(),
        status: e.status().map(|s| s.as_u16()),
        timed_out,
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

fn api_error(body: &Value) -> Option<ApiErrorBody> {
    body.get("code")?;
    ApiErrorBody::deserialize(body).ok()
}

fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(api) => format!("Binance API error {}: {}", api.code, api.msg),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => truncate(body),
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_IN_ERROR {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_BODY_IN_ERROR).collect();
    out.push_str("...");
    out
}
