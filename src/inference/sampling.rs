// src/inference/sampling.rs
// Fixed sampling contract for chat generation and summary length bounds

use serde::Serialize;

/// Sampling parameters sent with every chat generation call.
///
/// These values are a reproducibility contract, not per-call knobs: they
/// bias the model toward diverse, non-repetitive short replies.
#[derive(Debug, Clone, Serialize)]
pub struct SamplingOptions {
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub top_p: f32,
    pub top_k: u32,
    pub temperature: f32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
}

impl SamplingOptions {
    /// The chat contract: up to 100 new tokens, nucleus 0.92, top-k 50,
    /// temperature 0.9, repetition penalty 1.3, no repeated trigrams
    pub fn chat() -> Self {
        Self {
            max_new_tokens: 100,
            do_sample: true,
            top_p: 0.92,
            top_k: 50,
            temperature: 0.9,
            repetition_penalty: 1.3,
            no_repeat_ngram_size: 3,
        }
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::chat()
    }
}

/// Output-length bounds for one summarization call
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryBounds {
    pub min_new_tokens: u32,
    pub max_new_tokens: u32,
}

impl SummaryBounds {
    /// Bounds for PDF document summaries
    pub fn document() -> Self {
        Self {
            min_new_tokens: 30,
            max_new_tokens: 150,
        }
    }

    /// Bounds for plain text file summaries
    pub fn text_file() -> Self {
        Self {
            min_new_tokens: 10,
            max_new_tokens: 100,
        }
    }
}
