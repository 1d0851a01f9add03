//! Shared HTTP plumbing for the provider adapters.

use relay_application::ProviderError;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// Bodies longer than this are cut in error messages.
const ERROR_BODY_LIMIT: usize = 2_000;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Other(format!("Failed to build HTTP client: {}", e)))
}

fn map_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::InvalidResponse(err.to_string())
    } else {
        ProviderError::ConnectionError(err.to_string())
    }
}

/// POST `body` and decode the JSON reply.
///
/// Non-2xx statuses become [`ProviderError::HttpStatus`] carrying the body.
pub(crate) async fn post_json(
    request: RequestBuilder,
    body: &Value,
) -> Result<Value, ProviderError> {
    trace!("Request body: {}", body);

    let response = request.json(body).send().await.map_err(map_transport)?;
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        debug!("Provider returned HTTP {}", status.as_u16());
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: relay_domain::util::truncate_str(&text, ERROR_BODY_LIMIT).to_string(),
        });
    }

    let text = response.text().await.map_err(map_transport)?;
    serde_json::from_str(&text)
        .map_err(|e| ProviderError::InvalidResponse(format!("Response is not JSON: {}", e)))
}

/// Trim a trailing slash so paths can be appended with `/`.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Read an unsigned token count at `pointer`, defaulting to zero.
pub(crate) fn token_count(body: &Value, pointer: &str) -> u64 {
    body.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("https://api.anthropic.com", "v1/messages"),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_token_count_defaults_to_zero() {
        let body = json!({ "usage": { "prompt_tokens": 12 } });
        assert_eq!(token_count(&body, "/usage/prompt_tokens"), 12);
        assert_eq!(token_count(&body, "/usage/completion_tokens"), 0);
    }
}
