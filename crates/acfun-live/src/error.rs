use thiserror::Error;

/// Failures raised by the AcFun protocol client.
///
/// Every variant here is a *fault*: something went wrong at the transport or
/// decoding layer and the whole operation can be re-run. Logical outcomes
/// (unknown user, offline broadcaster, no playable representation) are never
/// errors; they surface as empty values on the `Ok` path.
#[derive(Debug, Error)]
pub enum AcfunError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing cookie `{0}` in response")]
    MissingCookie(&'static str),
    #[error("protocol error: {0}")]
    Protocol(String),
}
