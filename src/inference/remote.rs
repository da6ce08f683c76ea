// src/inference/remote.rs
// Production capability wiring: JSON calls to an inference sidecar that
// hosts the pre-trained pipelines

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, RgbImage};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inference::capability::{
    GenerationRequest, Generator, ImageClassifier, LabelScore, Summarizer, TokenId,
};
use crate::inference::sampling::SummaryBounds;
use crate::{BanterError, Result};

/// Generation calls cover a full sampling pass; keep the window generous
const REQUEST_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;

fn sidecar_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// POST a JSON body and deserialize the JSON reply. Failures are surfaced
/// as inference errors; nothing is retried.
async fn post_json<B: Serialize, R: DeserializeOwned>(
    client: &Client,
    url: &str,
    body: &B,
) -> Result<R> {
    let response = client.post(url).json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(BanterError::Inference(format!(
            "sidecar error {status}: {error_body}"
        )));
    }
    Ok(response.json().await?)
}

// --- Generation ---

#[derive(Serialize)]
struct EncodeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    ids: Vec<TokenId>,
}

#[derive(Serialize)]
struct DecodeRequest<'a> {
    ids: &'a [TokenId],
    skip_special_tokens: bool,
}

#[derive(Deserialize)]
struct DecodeResponse {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    /// Full sequence: input ids followed by the newly generated ids
    sequence: Vec<TokenId>,
}

/// Text generation over the sidecar's tokenizer and causal-LM endpoints
pub struct RemoteGenerator {
    base_url: String,
    model: String,
    end_of_turn: TokenId,
    client: Client,
}

impl RemoteGenerator {
    pub fn new(base_url: String, model: String, end_of_turn: TokenId) -> Self {
        Self {
            base_url,
            model,
            end_of_turn,
            client: sidecar_client(),
        }
    }
}

#[async_trait]
impl Generator for RemoteGenerator {
    async fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let url = format!("{}/encode", self.base_url);
        let response: EncodeResponse = post_json(&self.client, &url, &EncodeRequest { text })
            .await
            .map_err(|e| BanterError::Tokenizer(e.to_string()))?;
        Ok(response.ids)
    }

    async fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        let url = format!("{}/decode", self.base_url);
        let response: DecodeResponse = post_json(
            &self.client,
            &url,
            &DecodeRequest {
                ids: tokens,
                skip_special_tokens: true,
            },
        )
        .await
        .map_err(|e| BanterError::Tokenizer(e.to_string()))?;
        Ok(response.text)
    }

    fn end_of_turn(&self) -> TokenId {
        self.end_of_turn
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<TokenId>> {
        let url = format!("{}/generate", self.base_url);
        debug!(input_tokens = request.input_len(), "generation request");
        let response: GenerateResponse = post_json(&self.client, &url, request).await?;
        Ok(response.sequence)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

// --- Image classification ---

#[derive(Serialize)]
struct ClassifyRequest {
    /// PNG pixels, base64-encoded
    image_png_b64: String,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    predictions: Vec<LabelScore>,
}

/// Image classification over the sidecar's vision endpoint
pub struct RemoteClassifier {
    base_url: String,
    model: String,
    client: Client,
}

impl RemoteClassifier {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            model: "vit-base-patch16-224".to_string(),
            client: sidecar_client(),
        }
    }
}

#[async_trait]
impl ImageClassifier for RemoteClassifier {
    async fn classify(&self, image: &RgbImage) -> Result<Vec<LabelScore>> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let url = format!("{}/classify", self.base_url);
        let request = ClassifyRequest {
            image_png_b64: BASE64.encode(&png),
        };
        let response: ClassifyResponse = post_json(&self.client, &url, &request).await?;
        Ok(response.predictions)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

// --- Summarization ---

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    min_new_tokens: u32,
    max_new_tokens: u32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary_text: String,
}

/// Summarization over the sidecar's seq2seq endpoint
pub struct RemoteSummarizer {
    base_url: String,
    model: String,
    client: Client,
}

impl RemoteSummarizer {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            model: "distilbart-cnn-12-6".to_string(),
            client: sidecar_client(),
        }
    }
}

#[async_trait]
impl Summarizer for RemoteSummarizer {
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String> {
        let url = format!("{}/summarize", self.base_url);
        let request = SummarizeRequest {
            text,
            min_new_tokens: bounds.min_new_tokens,
            max_new_tokens: bounds.max_new_tokens,
            do_sample: false,
        };
        let response: SummarizeResponse = post_json(&self.client, &url, &request).await?;
        Ok(response.summary_text)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_reports_model_and_marker() {
        let generator =
            RemoteGenerator::new("http://127.0.0.1:9".into(), "DialoGPT-medium".into(), 50256);
        assert_eq!(generator.model_name(), "DialoGPT-medium");
        assert_eq!(generator.end_of_turn(), 50256);
    }

    #[tokio::test]
    async fn test_unreachable_sidecar_is_an_error() {
        let generator = RemoteGenerator::new("http://127.0.0.1:1".into(), "m".into(), 0);
        let result = generator.generate(&GenerationRequest::new(vec![1, 2, 3])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_encode_maps_to_tokenizer_error() {
        let generator = RemoteGenerator::new("http://127.0.0.1:1".into(), "m".into(), 0);
        let result = generator.encode("hello").await;
        assert!(matches!(result, Err(BanterError::Tokenizer(_))));
    }

    #[tokio::test]
    async fn test_unreachable_classifier_is_an_error() {
        let classifier = RemoteClassifier::new("http://127.0.0.1:1".into());
        let image = RgbImage::new(2, 2);
        assert!(classifier.classify(&image).await.is_err());
    }
}
