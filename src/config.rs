//! Planner configuration.
//!
//! Everything has a usable default; [`PlannerConfig::from_env`] fills in
//! credentials and endpoints from the process environment.

use crate::chat::ChatConfig;
use crate::mapbox::MapboxConfig;
use crate::osrm::OsrmConfig;
use crate::pipeline::PipelineOptions;

/// Values shipped in sample env files that mean "not configured".
const PLACEHOLDER_TOKENS: [&str; 4] = [
    "your_mapbox_access_token_here",
    "your_gemini_api_key_here",
    "demo-token",
    "demo-key",
];

#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub chat: ChatConfig,
    pub mapbox: MapboxConfig,
    /// Route trips through a self-hosted OSRM instead of Mapbox.
    pub osrm: Option<OsrmConfig>,
    pub pipeline: PipelineOptions,
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source.
    ///
    /// Recognized keys: `GEMINI_API_URL`, `SUDO_API_KEY` (or `GEMINI_API_KEY`),
    /// `CHAT_MODEL`, `MAPBOX_ACCESS_TOKEN`, `MAPBOX_PROFILE`, `OSRM_URL`,
    /// `OSRM_PROFILE`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secret = |key: &str| value(key).filter(|v| !PLACEHOLDER_TOKENS.contains(&v.as_str()));

        let mut config = Self::default();

        if let Some(url) = value("GEMINI_API_URL") {
            config.chat.api_url = url;
        }
        if let Some(key) = secret("SUDO_API_KEY").or_else(|| secret("GEMINI_API_KEY")) {
            config.chat.api_key = key;
        }
        if let Some(model) = value("CHAT_MODEL") {
            config.chat.model = model;
        }

        if let Some(token) = secret("MAPBOX_ACCESS_TOKEN") {
            config.mapbox.access_token = token;
        }
        if let Some(profile) = value("MAPBOX_PROFILE") {
            config.mapbox.profile = profile;
        }

        if let Some(base_url) = value("OSRM_URL") {
            let mut osrm = OsrmConfig {
                base_url,
                ..Default::default()
            };
            if let Some(profile) = value("OSRM_PROFILE") {
                osrm.profile = profile;
            }
            config.osrm = Some(osrm);
        }

        config
    }

    pub fn has_chat(&self) -> bool {
        !self.chat.api_key.is_empty()
    }

    pub fn has_mapbox(&self) -> bool {
        !self.mapbox.access_token.is_empty()
    }
}
