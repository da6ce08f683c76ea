// src/intake/mod.rs
// File intake dispatcher: classify one upload, extract a bounded payload,
// route it to the right capability, always reclaim the staged file

mod artifact;
mod extract;

pub use artifact::{sanitize_filename, ArtifactKind, StoredArtifact};
pub use extract::{truncate_chars, MAX_PAYLOAD_CHARS};

use std::sync::Arc;

use tracing::warn;

use crate::inference::{ImageClassifier, Summarizer, SummaryBounds};
use crate::Result;

pub const IMAGE_UNAVAILABLE_REPLY: &str = "Sorry, image analysis isn't available right now.";
pub const IMAGE_TROUBLE_REPLY: &str =
    "I had trouble analyzing that image. Can you try another one?";
pub const PDF_UNREADABLE_REPLY: &str =
    "I couldn't read that PDF file. Is it text-based or scanned images?";
pub const TEXT_UNREADABLE_REPLY: &str =
    "I couldn't read that text file. Is it in a standard format?";
pub const UNSUPPORTED_REPLY: &str = "I can work with images (.jpg, .png, .gif), PDFs, and text \
     files (.txt, .md). What type of file did you want to share?";

/// Number of ranked labels shown for an image
const TOP_PREDICTIONS: usize = 3;

/// Routes uploads to the classification and summarization capabilities.
/// Either capability may be absent; every path degrades to a fixed reply.
pub struct FileIntake {
    classifier: Option<Arc<dyn ImageClassifier>>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl FileIntake {
    pub fn new(
        classifier: Option<Arc<dyn ImageClassifier>>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Self {
        Self {
            classifier,
            summarizer,
        }
    }

    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn summarizer_loaded(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Produce exactly one reply for the upload. The staged file is
    /// reclaimed before the reply is returned, on every path.
    pub async fn handle_upload(&self, artifact: StoredArtifact) -> String {
        let reply = match artifact.kind() {
            ArtifactKind::Image => self.describe_image(&artifact).await,
            ArtifactKind::Pdf => self.summarize_pdf(&artifact).await,
            ArtifactKind::Text => self.summarize_text_file(&artifact).await,
            ArtifactKind::Unsupported => UNSUPPORTED_REPLY.to_string(),
        };
        drop(artifact);
        reply
    }

    async fn describe_image(&self, artifact: &StoredArtifact) -> String {
        let Some(classifier) = &self.classifier else {
            return IMAGE_UNAVAILABLE_REPLY.to_string();
        };
        match self.rank_image_labels(classifier, artifact).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(file = artifact.filename(), error = %e, "image analysis failed");
                IMAGE_TROUBLE_REPLY.to_string()
            }
        }
    }

    async fn rank_image_labels(
        &self,
        classifier: &Arc<dyn ImageClassifier>,
        artifact: &StoredArtifact,
    ) -> Result<String> {
        let bytes = tokio::fs::read(artifact.path()).await?;
        let image = image::load_from_memory(&bytes)?.to_rgb8();
        let predictions = classifier.classify(&image).await?;
        let Some(top) = predictions.first() else {
            return Err(crate::BanterError::Inference(
                "classifier returned no predictions".into(),
            ));
        };

        let mut reply = String::from("I analyzed your image. Here's what I found:\n");
        for (i, prediction) in predictions.iter().take(TOP_PREDICTIONS).enumerate() {
            reply.push_str(&format!(
                "{}. {} (confidence: {:.1}%)\n",
                i + 1,
                prediction.label,
                prediction.score * 100.0
            ));
        }
        if top.score > 0.8 {
            reply.push_str(&format!("\nI'm pretty confident this is a {}!", top.label));
        } else {
            reply.push_str("\nThe image is a bit unclear, but those are my best guesses.");
        }
        Ok(reply)
    }

    async fn summarize_pdf(&self, artifact: &StoredArtifact) -> String {
        let text = match extract::pdf_text(artifact.path()) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = artifact.filename(), error = %e, "PDF extraction failed");
                return PDF_UNREADABLE_REPLY.to_string();
            }
        };
        if text.is_empty() {
            return PDF_UNREADABLE_REPLY.to_string();
        }
        let Some(summarizer) = &self.summarizer else {
            return PDF_UNREADABLE_REPLY.to_string();
        };

        match summarizer.summarize(&text, SummaryBounds::document()).await {
            Ok(summary) => format!(
                "I've read your PDF document. Here's a summary:\n\n{summary}\n\nWould you like to know anything specific about it?"
            ),
            Err(e) => {
                warn!(file = artifact.filename(), error = %e, "PDF summarization failed");
                format!(
                    "I extracted {} characters from your PDF, but couldn't summarize it. The document seems to be about: {}...",
                    text.chars().count(),
                    truncate_chars(&text, 200)
                )
            }
        }
    }

    async fn summarize_text_file(&self, artifact: &StoredArtifact) -> String {
        let text = match extract::text_payload(artifact.path()).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file = artifact.filename(), error = %e, "text file read failed");
                return TEXT_UNREADABLE_REPLY.to_string();
            }
        };

        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();
        let mut reply =
            format!("I've read your text file ({word_count} words, {char_count} characters).\n\n");

        if let Some(summarizer) = self.summarizer.as_ref().filter(|_| char_count > 200) {
            match summarizer.summarize(&text, SummaryBounds::text_file()).await {
                Ok(summary) => reply.push_str(&format!("Summary: {summary}")),
                Err(e) => {
                    warn!(file = artifact.filename(), error = %e, "text summarization failed");
                    reply.push_str(&format!(
                        "Beginning of the file: {}...",
                        truncate_chars(&text, 200)
                    ));
                }
            }
        } else if char_count > 500 {
            reply.push_str(&format!("Content: {}...", truncate_chars(&text, 500)));
        } else {
            reply.push_str(&format!("Content: {text}"));
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::LabelScore;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::path::Path;

    struct StubClassifier {
        predictions: Vec<LabelScore>,
    }

    #[async_trait]
    impl ImageClassifier for StubClassifier {
        async fn classify(&self, _image: &RgbImage) -> crate::Result<Vec<LabelScore>> {
            Ok(self.predictions.clone())
        }

        fn model_name(&self) -> String {
            "stub-classifier".to_string()
        }
    }

    struct StubSummarizer {
        fail: bool,
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> crate::Result<String> {
            if self.fail {
                Err(crate::BanterError::Inference("stub summarizer down".into()))
            } else {
                Ok("a short summary".to_string())
            }
        }

        fn model_name(&self) -> String {
            "stub-summarizer".to_string()
        }
    }

    fn intake_with(
        classifier: Option<Arc<dyn ImageClassifier>>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> FileIntake {
        FileIntake::new(classifier, summarizer)
    }

    async fn stage(dir: &Path, name: &str, bytes: &[u8]) -> StoredArtifact {
        StoredArtifact::stage(dir, name, bytes).await.unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::new(4, 4);
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_unsupported_upload_gets_fixed_reply_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, None);
        let artifact = stage(dir.path(), "notes.xyz", b"whatever").await;
        let path = artifact.path().to_path_buf();

        let reply = intake.handle_upload(artifact).await;
        assert_eq!(reply, UNSUPPORTED_REPLY);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_confident_image_reply() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Arc::new(StubClassifier {
            predictions: vec![
                LabelScore {
                    label: "cat".into(),
                    score: 0.95,
                },
                LabelScore {
                    label: "dog".into(),
                    score: 0.03,
                },
            ],
        });
        let intake = intake_with(Some(classifier), None);
        let artifact = stage(dir.path(), "photo.png", &png_bytes()).await;
        let path = artifact.path().to_path_buf();

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains("cat"));
        assert!(reply.contains("95.0%"));
        assert!(reply.contains("pretty confident"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unclear_image_reply_hedges() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Arc::new(StubClassifier {
            predictions: vec![LabelScore {
                label: "toaster".into(),
                score: 0.4,
            }],
        });
        let intake = intake_with(Some(classifier), None);
        let artifact = stage(dir.path(), "blur.jpg", &png_bytes()).await;

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains("best guesses"));
    }

    #[tokio::test]
    async fn test_image_without_classifier_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, None);
        let artifact = stage(dir.path(), "photo.png", &png_bytes()).await;
        let path = artifact.path().to_path_buf();

        let reply = intake.handle_upload(artifact).await;
        assert_eq!(reply, IMAGE_UNAVAILABLE_REPLY);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_trouble_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Arc::new(StubClassifier { predictions: vec![] });
        let intake = intake_with(Some(classifier), None);
        let artifact = stage(dir.path(), "photo.png", b"these are not pixels").await;
        let path = artifact.path().to_path_buf();

        let reply = intake.handle_upload(artifact).await;
        assert_eq!(reply, IMAGE_TROUBLE_REPLY);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_short_text_embedded_whole() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, Some(Arc::new(StubSummarizer { fail: false })));
        let artifact = stage(dir.path(), "note.txt", b"hello world").await;

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains("2 words, 11 characters"));
        assert!(reply.contains("Content: hello world"));
        assert!(!reply.contains("..."));
    }

    #[tokio::test]
    async fn test_long_text_without_summarizer_shows_first_500() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, None);
        let body = "b".repeat(900);
        let artifact = stage(dir.path(), "long.md", body.as_bytes()).await;

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains(&format!("Content: {}...", "b".repeat(500))));
    }

    #[tokio::test]
    async fn test_mid_size_text_without_summarizer_embedded_whole() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, None);
        let body = "c".repeat(300);
        let artifact = stage(dir.path(), "mid.txt", body.as_bytes()).await;

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains(&format!("Content: {body}")));
        assert!(!reply.contains("..."));
    }

    #[tokio::test]
    async fn test_long_text_with_summarizer_gets_summary() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, Some(Arc::new(StubSummarizer { fail: false })));
        let body = "word ".repeat(100);
        let artifact = stage(dir.path(), "essay.txt", body.as_bytes()).await;

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains("Summary: a short summary"));
    }

    #[tokio::test]
    async fn test_summarizer_failure_falls_back_to_beginning() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, Some(Arc::new(StubSummarizer { fail: true })));
        let body = "d".repeat(400);
        let artifact = stage(dir.path(), "essay.txt", body.as_bytes()).await;

        let reply = intake.handle_upload(artifact).await;
        assert!(reply.contains("Beginning of the file:"));
        assert!(reply.contains(&"d".repeat(200)));
    }

    #[tokio::test]
    async fn test_broken_pdf_gets_unreadable_reply_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake_with(None, Some(Arc::new(StubSummarizer { fail: false })));
        let artifact = stage(dir.path(), "paper.pdf", b"not a pdf at all").await;
        let path = artifact.path().to_path_buf();

        let reply = intake.handle_upload(artifact).await;
        assert_eq!(reply, PDF_UNREADABLE_REPLY);
        assert!(!path.exists());
    }
}
