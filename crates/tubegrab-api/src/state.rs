//! Application state.

use std::sync::Arc;

use tracing::info;
use tubegrab_extractor::{ExtractorAdapter, PipedResolver, StreamResolver, YtDlpResolver};

use crate::config::{ApiConfig, ResolverBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub extractor: ExtractorAdapter,
    /// Client for media origin fetches.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state, constructing the configured resolver.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let http = build_http_client(&config)?;

        let resolver: Arc<dyn StreamResolver> = match config.resolver_backend {
            ResolverBackend::YtDlp => Arc::new(YtDlpResolver::new(
                config.ytdlp_path.clone(),
                config.ytdlp_cookies.clone(),
            )?),
            ResolverBackend::Piped => {
                info!("Using Piped instance at {}", config.piped_api_url);
                Arc::new(PipedResolver::new(http.clone(), config.piped_api_url.clone()))
            }
        };

        Ok(Self::assemble(config, resolver, http))
    }

    /// Create state around an existing resolver.
    pub fn with_resolver(
        config: ApiConfig,
        resolver: Arc<dyn StreamResolver>,
    ) -> anyhow::Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self::assemble(config, resolver, http))
    }

    fn assemble(config: ApiConfig, resolver: Arc<dyn StreamResolver>, http: reqwest::Client) -> Self {
        let extractor = ExtractorAdapter::new(resolver, config.resolve_timeout);
        Self {
            config,
            extractor,
            http,
        }
    }
}

fn build_http_client(config: &ApiConfig) -> reqwest::Result<reqwest::Client> {
    // No total timeout: downloads may legitimately run for a long time.
    reqwest::Client::builder()
        .connect_timeout(config.upstream_connect_timeout)
        .user_agent(config.upstream_user_agent.clone())
        .build()
}
