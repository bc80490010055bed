use reqwest::header::HeaderMap;
use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;
use tracing::warn;

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings used to build a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The timeout in seconds for every request made by the client
    pub timeout_secs: u64,
    /// Whether the client should follow redirects
    pub follow_redirects: bool,
    /// Skip TLS certificate verification. Only meant for sandbox gateways
    /// running with self-signed certificates.
    pub accept_invalid_certs: bool,
    /// Value of the `User-Agent` header, if any
    pub user_agent: Option<String>,
    /// Headers sent with every request
    pub default_headers: HeaderMap,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            follow_redirects: true,
            accept_invalid_certs: false,
            user_agent: None,
            default_headers: HeaderMap::new(),
        }
    }
}

/// Creates a new HTTP client with custom configuration.
///
/// # Arguments
///
/// * `options` - Timeout, redirect, TLS and header settings for the client
///
/// # Returns
///
/// A new reqwest::Client instance with the specified configuration
pub fn create_client(options: &ClientOptions) -> Result<Client, ReqwestError> {
    if options.accept_invalid_certs {
        warn!("Building HTTP client with TLS certificate verification disabled");
    }

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(options.timeout_secs))
        .redirect(if options.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        })
        .danger_accept_invalid_certs(options.accept_invalid_certs)
        .default_headers(options.default_headers.clone());

    if let Some(user_agent) = options.user_agent.as_deref() {
        builder = builder.user_agent(user_agent);
    }

    builder.build()
}
