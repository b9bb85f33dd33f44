use std::env;
use std::path::PathBuf;

/// Runtime configuration for the OpenAI admin API client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub organization: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub defaults_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - OPENAI_ADMIN_KEY (or OPENAI_API_KEY) [required]
    /// - OPENAI_API_URL (default: https://api.openai.com/v1)
    /// - OPENAI_ORGANIZATION (optional)
    /// - OPENAI_HTTP_TIMEOUT_SECS (default: 30)
    /// - OPENAI_HTTP_MAX_RETRIES (default: 2)
    /// - OPENAI_USER_AGENT (default: openai-rate-limits/<version>)
    /// - OPENAI_RATE_LIMIT_DEFAULTS_FILE (optional JSON default table)
    pub fn from_env() -> Result<Self, String> {
        let token = env::var("OPENAI_ADMIN_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| "Missing OPENAI_ADMIN_KEY or OPENAI_API_KEY".to_string())?;

        let api_url = env::var("OPENAI_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&api_url).map_err(|e| format!("Invalid OPENAI_API_URL: {}", e))?;

        let organization = env::var("OPENAI_ORGANIZATION")
            .ok()
            .filter(|s| !s.is_empty());
        let timeout_secs = env::var("OPENAI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(30);
        let max_retries = env::var("OPENAI_HTTP_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);
        let default_ua = format!("openai-rate-limits/{}", env!("CARGO_PKG_VERSION"));
        let user_agent = env::var("OPENAI_USER_AGENT").unwrap_or(default_ua);
        let defaults_file = env::var("OPENAI_RATE_LIMIT_DEFAULTS_FILE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            token,
            api_url,
            organization,
            user_agent,
            timeout_secs,
            max_retries,
            defaults_file,
        })
    }

    /// Configuration pointing at an explicit base URL; used by tests and embedders.
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            organization: None,
            user_agent: format!("openai-rate-limits/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            max_retries: 2,
            defaults_file: None,
        }
    }
}
