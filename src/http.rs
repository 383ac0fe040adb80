//! Shared request plumbing for every remote service this client talks to.
//!
//! Status classification lives here so each service module only builds its
//! request and maps the decoded body.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::KcatError;

pub fn build_client(timeout: Duration) -> Result<Client, KcatError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("kcat-hub/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| KcatError::Network(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| KcatError::Network(err.to_string()))
}

/// No response at all (connect, timeout, aborted body) is a network failure.
pub fn transport_error(err: reqwest::Error) -> KcatError {
    KcatError::Network(err.to_string())
}

pub async fn check_response(response: Response) -> Result<Response, KcatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = classify_status(status, &body);
    tracing::warn!(status = status.as_u16(), %err, "request rejected");
    Err(err)
}

pub fn classify_status(status: StatusCode, body: &str) -> KcatError {
    match status {
        StatusCode::UNAUTHORIZED => KcatError::AuthExpired,
        StatusCode::FORBIDDEN => KcatError::AuthForbidden,
        _ => KcatError::Upstream {
            status: status.as_u16(),
            message: error_payload_message(body),
        },
    }
}

/// Pulls `error` out of a JSON error body, if the backend sent one.
pub fn error_payload_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|value| value.as_str())
                .map(|value| value.trim().to_string())
        })
        .filter(|message| !message.is_empty())
}

pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, KcatError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|err| KcatError::MalformedResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn mock_response(status: u16, body: &'static str) -> Response {
        Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn unauthorized_is_expired_login() {
        let err = check_response(mock_response(401, "")).await.unwrap_err();
        assert_matches!(err, KcatError::AuthExpired);
    }

    #[tokio::test]
    async fn forbidden_is_distinct_from_expired() {
        let err = check_response(mock_response(403, r#"{"error":"nope"}"#))
            .await
            .unwrap_err();
        assert_matches!(err, KcatError::AuthForbidden);
    }

    #[tokio::test]
    async fn upstream_error_keeps_backend_message() {
        let err = check_response(mock_response(422, r#"{"error":"kcat must be positive"}"#))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            KcatError::Upstream { status: 422, message: Some(ref message) }
                if message == "kcat must be positive"
        );
    }

    #[tokio::test]
    async fn upstream_error_without_payload() {
        let err = check_response(mock_response(500, "<html>oops</html>"))
            .await
            .unwrap_err();
        assert_matches!(err, KcatError::Upstream { status: 500, message: None });
    }

    #[tokio::test]
    async fn success_passes_through() {
        let response = check_response(mock_response(200, "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn undecodable_success_body_is_malformed() {
        let result: Result<Value, _> = decode_json(mock_response(200, "not json")).await;
        assert_matches!(result, Err(KcatError::MalformedResponse(_)));
    }
}
