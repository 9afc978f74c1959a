//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `BAZAAR_API_URL` - Storefront base URL (default: `http://127.0.0.1:3000`)
//! - `BAZAAR_API_TOKEN` - Optional API token; when set, the cart lives on the server
//! - `BAZAAR_DATA_DIR` - Directory for the guest cart (default: `.bazaar`)
//! - `BAZAAR_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Storefront base URL
    pub api_url: Url,
    /// API token; `None` selects the guest cart
    pub api_token: Option<SecretString>,
    /// Directory holding the guest cart file
    pub data_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for a given base URL with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if `api_url` does not parse.
    pub fn new(api_url: &str) -> ClientResult<Self> {
        Ok(Self {
            api_url: Url::parse(api_url)?,
            api_token: None,
            data_dir: PathBuf::from(".bazaar"),
            timeout: Duration::from_secs(10),
        })
    }

    /// Set the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` for a malformed `BAZAAR_API_URL` and
    /// `ClientError::Config` for a malformed timeout.
    pub fn from_env() -> ClientResult<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::new(
            &std::env::var("BAZAAR_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into()),
        )?;
        config.api_token = std::env::var("BAZAAR_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);
        if let Ok(dir) = std::env::var("BAZAAR_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("BAZAAR_HTTP_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|e| {
                ClientError::Config(format!("BAZAAR_HTTP_TIMEOUT_SECS: {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Whether the authenticated (server-side) cart is used.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.api_token.is_some()
    }
}
