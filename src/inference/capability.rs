// src/inference/capability.rs
// Capability abstraction layer - one trait per black-box model

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::inference::sampling::{SamplingOptions, SummaryBounds};

/// Opaque generation token id
pub type TokenId = u32;

/// One ranked prediction from the image classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    /// Confidence in [0, 1]
    pub score: f32,
}

/// One generation call: token input, its attention mask, and the fixed
/// sampling contract
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub input_ids: Vec<TokenId>,
    /// Ones covering exactly the input length
    pub attention_mask: Vec<u8>,
    pub options: SamplingOptions,
}

impl GenerationRequest {
    /// Build a request for the given input, deriving the attention mask
    pub fn new(input_ids: Vec<TokenId>) -> Self {
        let attention_mask = vec![1; input_ids.len()];
        Self {
            input_ids,
            attention_mask,
            options: SamplingOptions::chat(),
        }
    }

    pub fn input_len(&self) -> usize {
        self.input_ids.len()
    }
}

/// Text generation capability: tokenize, generate, detokenize
#[async_trait]
pub trait Generator: Send + Sync {
    /// Encode text into generation tokens (no end-of-turn marker appended)
    async fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Decode generation tokens back into text, skipping special tokens
    async fn decode(&self, tokens: &[TokenId]) -> Result<String>;

    /// Marker appended after every encoded user turn
    fn end_of_turn(&self) -> TokenId;

    /// Run one generation step. Returns the full sequence: the request's
    /// input followed by the newly generated tokens.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<TokenId>>;

    /// Display name of the underlying model
    fn model_name(&self) -> String;
}

/// Image classification capability
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Classify a decoded RGB image, returning ranked labels (best first)
    async fn classify(&self, image: &RgbImage) -> Result<Vec<LabelScore>>;

    /// Display name of the underlying model
    fn model_name(&self) -> String;
}

/// Text summarization capability (deterministic, non-sampled)
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize text within the given output-length bounds
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String>;

    /// Display name of the underlying model
    fn model_name(&self) -> String;
}
