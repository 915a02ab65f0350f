//! Client configuration

use std::time::Duration;

/// Host that serves `b2_authorize_account`
pub const DEFAULT_AUTH_URL: &str = "https://api.backblazeb2.com";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the authorization endpoint
    pub auth_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// How long a cached authorization token is trusted before `authorize` logs in again
    pub token_lifetime: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("b2-client/{}", env!("CARGO_PKG_VERSION")),
            token_lifetime: Duration::from_secs(24 * 60 * 60), // 24 hours
        }
    }
}

impl Config {
    /// Create a config pointing at a different authorization host
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set token lifetime
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.auth_url, "https://api.backblazeb2.com");
        assert_eq!(config.token_lifetime, Duration::from_secs(86_400));
        assert!(config.user_agent.starts_with("b2-client/"));
    }

    #[test]
    fn test_builders() {
        let config = Config::new("http://127.0.0.1:9000")
            .with_timeout(Duration::from_secs(5))
            .with_token_lifetime(Duration::from_secs(60));

        assert_eq!(config.auth_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token_lifetime, Duration::from_secs(60));
    }
}
