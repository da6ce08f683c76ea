// src/web/state.rs
// Web server state management

use std::sync::Arc;

use crate::chat::TurnManager;
use crate::config::{InferenceEndpoints, UploadConfig};
use crate::inference::{
    Generator, ImageClassifier, RemoteClassifier, RemoteGenerator, RemoteSummarizer, Summarizer,
};
use crate::intake::FileIntake;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Turn manager; absent when the generation capability never loaded
    pub turns: Option<Arc<TurnManager>>,

    /// Upload dispatcher (its capabilities may individually be absent)
    pub intake: Arc<FileIntake>,

    /// Upload staging configuration
    pub uploads: UploadConfig,
}

impl AppState {
    /// Create application state from explicit parts (tests wire stubs here)
    pub fn new(
        turns: Option<Arc<TurnManager>>,
        intake: Arc<FileIntake>,
        uploads: UploadConfig,
    ) -> Self {
        Self {
            turns,
            intake,
            uploads,
        }
    }

    /// Production wiring: bind every configured endpoint to its remote
    /// capability client
    pub fn from_endpoints(endpoints: &InferenceEndpoints, uploads: UploadConfig) -> Self {
        let turns = endpoints.generation.as_ref().map(|url| {
            let generator: Arc<dyn Generator> = Arc::new(RemoteGenerator::new(
                url.clone(),
                endpoints.chat_model.clone(),
                endpoints.end_of_turn_token,
            ));
            Arc::new(TurnManager::new(generator))
        });

        let classifier: Option<Arc<dyn ImageClassifier>> = endpoints
            .classification
            .as_ref()
            .map(|url| Arc::new(RemoteClassifier::new(url.clone())) as _);

        let summarizer: Option<Arc<dyn Summarizer>> = endpoints
            .summarization
            .as_ref()
            .map(|url| Arc::new(RemoteSummarizer::new(url.clone())) as _);

        Self {
            turns,
            intake: Arc::new(FileIntake::new(classifier, summarizer)),
            uploads,
        }
    }
}
