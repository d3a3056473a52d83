/// Client configuration loaded from environment variables.
///
/// | Env Var                       | Default                 |
/// |-------------------------------|-------------------------|
/// | `STEEPLE_API_URL`             | `http://localhost:3000` |
/// | `STEEPLE_REQUEST_TIMEOUT_SECS`| `30`                    |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL without the `/api/v1` prefix or a trailing slash.
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: 30,
        }
    }

    /// Unparseable timeouts fall back to the default with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("STEEPLE_API_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
        );

        if let Ok(raw) = std::env::var("STEEPLE_REQUEST_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => config.request_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid STEEPLE_REQUEST_TIMEOUT_SECS"),
            }
        }

        config
    }
}
