// src/config.rs
// Environment-based configuration - single source of truth for all env vars

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::inference::TokenId;

/// Maximum accepted upload size (16 MiB)
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default end-of-turn token id (the eos id of the default chat model)
const DEFAULT_EOT_TOKEN: TokenId = 50256;

/// Inference sidecar endpoints loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct InferenceEndpoints {
    /// Text generation endpoint (BANTER_GENERATION_URL)
    pub generation: Option<String>,
    /// Image classification endpoint (BANTER_CLASSIFIER_URL)
    pub classification: Option<String>,
    /// Summarization endpoint (BANTER_SUMMARIZER_URL)
    pub summarization: Option<String>,
    /// End-of-turn marker appended to every encoded user turn
    pub end_of_turn_token: TokenId,
    /// Display name of the chat model, reported by /status
    pub chat_model: String,
}

impl InferenceEndpoints {
    /// Load endpoints from environment variables (single source of truth)
    ///
    /// Set `BANTER_DISABLE_INFERENCE=1` to suppress all endpoints (forces
    /// the canned fallback replies everywhere)
    pub fn from_env() -> Self {
        let end_of_turn_token = std::env::var("BANTER_EOT_TOKEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EOT_TOKEN);
        let chat_model = std::env::var("BANTER_CHAT_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "DialoGPT-medium".to_string());

        if parse_bool_env("BANTER_DISABLE_INFERENCE").unwrap_or(false) {
            info!("BANTER_DISABLE_INFERENCE is set - all capabilities disabled, using fallbacks");
            return Self {
                generation: None,
                classification: None,
                summarization: None,
                end_of_turn_token,
                chat_model,
            };
        }

        let endpoints = Self {
            generation: Self::read_url("BANTER_GENERATION_URL"),
            classification: Self::read_url("BANTER_CLASSIFIER_URL"),
            summarization: Self::read_url("BANTER_SUMMARIZER_URL"),
            end_of_turn_token,
            chat_model,
        };
        endpoints.log_status();
        endpoints
    }

    /// Read a single endpoint URL from environment, filtering empty values
    fn read_url(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
    }

    /// Check if the generation capability can be wired up
    pub fn has_generation(&self) -> bool {
        self.generation.is_some()
    }

    /// Log which capabilities are available (without exposing URLs)
    fn log_status(&self) {
        let mut available = Vec::new();
        if self.generation.is_some() {
            available.push("generation");
        }
        if self.classification.is_some() {
            available.push("classification");
        }
        if self.summarization.is_some() {
            available.push("summarization");
        }

        if available.is_empty() {
            warn!("No inference endpoints configured - all requests get canned fallbacks");
        } else {
            debug!(capabilities = ?available, "Inference endpoints loaded");
        }
    }
}

/// Upload handling configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where uploads are staged for the duration of one request
    pub dir: PathBuf,
}

impl UploadConfig {
    /// Load upload configuration, preferring an explicit directory over
    /// BANTER_UPLOAD_DIR over the `./uploads` default
    pub fn load(dir_override: Option<PathBuf>) -> Self {
        let dir = dir_override
            .or_else(|| std::env::var("BANTER_UPLOAD_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("./uploads"));
        Self { dir }
    }

    /// Make sure the staging directory exists
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }
}

/// Parse a boolean environment variable ("1", "true", "yes" are truthy)
fn parse_bool_env(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}
