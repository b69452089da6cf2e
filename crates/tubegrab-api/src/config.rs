//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Browser user agent sent to the media origin.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default Piped instance.
pub const DEFAULT_PIPED_API_URL: &str = "https://pipedapi.kavin.rocks";

/// Which resolver backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverBackend {
    YtDlp,
    Piped,
}

impl ResolverBackend {
    /// Parse a backend name; unknown names fall back to yt-dlp.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "piped" => ResolverBackend::Piped,
            _ => ResolverBackend::YtDlp,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Cap on formats returned by the info endpoint
    pub max_formats: usize,
    /// Resolver backend
    pub resolver_backend: ResolverBackend,
    /// yt-dlp binary; `None` searches `PATH`
    pub ytdlp_path: Option<PathBuf>,
    /// Cookies file passed to yt-dlp
    pub ytdlp_cookies: Option<PathBuf>,
    /// Piped API base URL
    pub piped_api_url: String,
    /// Timeout for one resolution
    pub resolve_timeout: Duration,
    /// Connect timeout towards the media origin
    pub upstream_connect_timeout: Duration,
    /// User agent for outbound requests
    pub upstream_user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 64 * 1024, // 64KB
            max_formats: 10,
            resolver_backend: ResolverBackend::YtDlp,
            ytdlp_path: None,
            ytdlp_cookies: None,
            piped_api_url: DEFAULT_PIPED_API_URL.to_string(),
            resolve_timeout: Duration::from_secs(30),
            upstream_connect_timeout: Duration::from_secs(15),
            upstream_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            max_formats: env_parse("MAX_FORMATS").unwrap_or(defaults.max_formats),
            resolver_backend: std::env::var("RESOLVER_BACKEND")
                .map(|s| ResolverBackend::parse(&s))
                .unwrap_or(defaults.resolver_backend),
            ytdlp_path: env_path("YTDLP_PATH"),
            ytdlp_cookies: env_path("YTDLP_COOKIES"),
            piped_api_url: std::env::var("PIPED_API_URL").unwrap_or(defaults.piped_api_url),
            resolve_timeout: env_parse("RESOLVE_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.resolve_timeout),
            upstream_connect_timeout: env_parse("UPSTREAM_CONNECT_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_connect_timeout),
            upstream_user_agent: std::env::var("UPSTREAM_USER_AGENT")
                .unwrap_or(defaults.upstream_user_agent),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
