use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rustls::ClientConfig;
use rustls::crypto::aws_lc_rs;
use rustls_platform_verifier::BuilderVerifierExt;

use crate::retry::RetryPolicy;

/// The profile endpoint rejects non-browser traffic, so every request
/// carries a fixed browser user-agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

/// Configurable options for the client.
#[derive(Debug, Clone)]
pub struct AcfunConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Overall timeout for a single HTTP request. This is the only timeout
    /// layer; no cancellation is stacked above it.
    pub timeout: Duration,
    /// Connection timeout (time to establish the initial connection).
    pub connect_timeout: Duration,
    /// Recovery policy applied to every network-touching operation.
    pub retry: RetryPolicy,
}

impl Default for AcfunConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Build the HTTP client with platform-verifier TLS.
pub(crate) fn default_client(config: &AcfunConfig) -> Client {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .expect("Failed to configure platform certificate verifier")
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .expect("Failed to create HTTP client")
}
