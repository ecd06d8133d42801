/// Third-party service clients
///
/// Each client wraps the shared `reqwest::Client` from [`crate::app::AppState`]
/// together with its configuration section. A client can only be built when
/// its section is configured; otherwise callers get
/// [`IntegrationError::NotConfigured`], which the API reports as `503`.
///
/// - `cloudinary`: signed uploads, upload proxy, asset deletion
/// - `mux`: video assets and direct uploads
/// - `stripe`: PaymentIntents and webhook signature checks
/// - `s3`: SigV4 presigned URLs for S3 / Backblaze B2
/// - `mixpanel`: page-view event forwarding

pub mod cloudinary;
pub mod mixpanel;
pub mod mux;
pub mod s3;
pub mod stripe;

use std::time::Duration;

/// User agent sent to every third-party API
pub const USER_AGENT: &str = concat!("atelier-api/", env!("CARGO_PKG_VERSION"));

/// Default timeout for integration requests
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Integration client errors
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{0}")]
    NotConfigured(&'static str),

    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response could not be parsed: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl IntegrationError {
    pub(crate) fn request(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| IntegrationError::Request { service, source }
    }

    pub(crate) fn decode(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |e| IntegrationError::Decode {
            service,
            message: e.to_string(),
        }
    }
}

/// Webhook signature verification errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    Missing,

    #[error("Malformed signature header")]
    Malformed,

    #[error("Signature timestamp outside tolerance")]
    Expired,

    #[error("Signature mismatch")]
    Mismatch,
}

/// Builds the HTTP client shared by all integrations
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Turns a non-success response into [`IntegrationError::Status`]
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(service, status = status.as_u16(), "Integration request failed");

    Err(IntegrationError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}
