//! Client configuration.

use eyre::Context;

/// Environment variable consulted by [`ClientConfig::from_env`].
pub const API_URL_ENV: &str = "VIDTUBE_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Settings needed to construct an [`ApiClient`](crate::api::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Absolute base URL every request path is appended to, without a trailing slash.
    pub base_url: String,
    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given base URL.
    ///
    /// The URL must be an absolute `http` or `https` URL. A trailing slash is removed so
    /// that request paths (which always start with `/`) can be appended directly.
    pub fn new(base_url: impl AsRef<str>) -> eyre::Result<Self> {
        let raw = base_url.as_ref().trim();
        let parsed = reqwest::Url::parse(raw)
            .with_context(|| format!("parse API base URL '{raw}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            eyre::bail!(
                "API base URL must use http or https, got '{}'",
                parsed.scheme()
            );
        }
        if parsed.cannot_be_a_base() {
            eyre::bail!("API base URL '{raw}' cannot be used as a base");
        }

        Ok(Self {
            base_url: raw.trim_end_matches('/').to_string(),
            user_agent: format!("vidtube-client/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Reads the base URL from `VIDTUBE_API_URL`, falling back to [`DEFAULT_API_URL`].
    pub fn from_env() -> eyre::Result<Self> {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                Self::new(&url).with_context(|| format!("read {API_URL_ENV}"))
            }
            _ => Self::new(DEFAULT_API_URL),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("vidtube-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = ClientConfig::new("https://api.example.com/api/v1/").unwrap();
        assert_eq!(config.base_url, "https://api.example.com/api/v1");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = ClientConfig::new("ftp://example.com").unwrap_err();
        insta::assert_snapshot!(err, @"API base URL must use http or https, got 'ftp'");
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(ClientConfig::new("/api/v1").is_err());
    }

    #[test]
    fn default_matches_constant() {
        assert_eq!(ClientConfig::default().base_url, DEFAULT_API_URL);
    }
}
