//! HTTP client wrapper for downloading statute documents.
//!
//! Performs exactly one request per call and classifies the outcome; retrying
//! and throttling are the job of [`crate::policy`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{FetchFailure, Result};
use crate::policy::Failure;

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("statute-harvester/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with appropriate timeout and user agent.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Successful response body with the metadata adapters care about.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Issue a single GET request and classify the outcome.
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to download from
/// * `headers` - Extra request headers (e.g. credentials)
pub fn get_once(
    client: &Client,
    url: &str,
    headers: &[(&str, String)],
) -> std::result::Result<Fetched, Failure> {
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(*name, value.as_str());
    }

    // Transport errors drop the URL: query strings may carry credentials
    let response = match request.send() {
        Ok(response) => response,
        // Connection and timeout errors may succeed on a later attempt
        Err(e) if e.is_connect() || e.is_timeout() => {
            return Err(Failure::Transient(FetchFailure::Http(e.without_url())));
        }
        Err(e) => return Err(Failure::Permanent(FetchFailure::Http(e.without_url()))),
    };

    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        );
        return Err(classify_status(status, retry_after));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response
        .bytes()
        .map_err(|e| Failure::Transient(FetchFailure::Http(e.without_url())))?;

    Ok(Fetched {
        url: url.to_string(),
        content_type,
        body: body.to_vec(),
    })
}

/// Map a non-success status code onto a failure class.
pub fn classify_status(status: StatusCode, retry_after: Option<Duration>) -> Failure {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => Failure::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Failure::Auth(format!("server responded with status {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            Failure::Transient(FetchFailure::RateLimited { retry_after })
        }
        StatusCode::REQUEST_TIMEOUT => Failure::Transient(FetchFailure::Status(status.as_u16())),
        s if s.is_server_error() => Failure::Transient(FetchFailure::Status(s.as_u16())),
        s => Failure::Permanent(FetchFailure::Status(s.as_u16())),
    }
}

/// Parse a `Retry-After` header given in seconds.
///
/// HTTP-date values are ignored; the regular backoff applies instead.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Decode response bytes as UTF-8, logging when replacement was needed.
pub fn bytes_to_string(bytes: &[u8], what: &str) -> String {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!(document = %what, "Response is not valid UTF-8, replacing invalid sequences");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let client = create_client();
        assert!(client.is_ok());
    }

    #[test]
    fn test_transport_error_omits_url() {
        let client = create_client().unwrap();
        let failure = get_once(&client, "http://127.0.0.1:1/laws?key=secret-value", &[]).unwrap_err();

        match failure {
            Failure::Transient(FetchFailure::Http(err)) => {
                assert!(err.url().is_none());
                assert!(!err.to_string().contains("secret-value"));
            }
            other => panic!("expected a transient transport failure, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, None),
            Failure::NotFound
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, None),
            Failure::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, None),
            Failure::Transient(FetchFailure::Status(503))
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(2))),
            Failure::Transient(FetchFailure::RateLimited { retry_after: Some(_) })
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, None),
            Failure::Permanent(FetchFailure::Status(400))
        ));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some(" 12 ")), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_bytes_to_string_lossy() {
        assert_eq!(bytes_to_string(b"plain", "test"), "plain");
        let text = bytes_to_string(&[b'a', 0xFF, b'b'], "test");
        assert!(text.starts_with('a'));
        assert!(text.ends_with('b'));
    }
}
