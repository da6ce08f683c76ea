// src/chat/turn.rs
// Conversational turn manager - owns the single running context buffer

use std::sync::Arc;

use rand::seq::IndexedRandom;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::Result;
use crate::inference::{GenerationRequest, Generator, TokenId, trim_context};

/// Fixed reply when a turn fails for any reason; the conversation is
/// cleared before it is returned
pub const RESTART_REPLY: &str =
    "I apologize, but I encountered an error. Let's start fresh. What would you like to talk about?";

/// Fixed reply when the generation capability never loaded
pub const UNAVAILABLE_REPLY: &str = "I apologize, but the AI model is not loaded properly.";

/// Substitutes for a reply that decodes to nothing
const FILLER_REPLIES: [&str; 6] = [
    "I see what you mean.",
    "That's interesting!",
    "Tell me more about that.",
    "I understand.",
    "Go on...",
    "Hmm, let me think about that.",
];

/// Accumulated dialogue history as generation tokens. Empty until the
/// first successful turn; never persisted across restarts.
#[derive(Debug, Default)]
pub struct ConversationState {
    context: Vec<TokenId>,
}

impl ConversationState {
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }

    pub fn len(&self) -> usize {
        self.context.len()
    }

    pub fn clear(&mut self) {
        self.context.clear();
    }
}

/// Owns the process-wide conversation. Turns serialize through the internal
/// mutex: the buffer is read, extended, trimmed, and replaced under one
/// lock, so concurrent requests cannot interleave a read-modify-write.
pub struct TurnManager {
    generator: Arc<dyn Generator>,
    state: Mutex<ConversationState>,
}

impl TurnManager {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            state: Mutex::new(ConversationState::default()),
        }
    }

    /// Run one turn. Never fails from the caller's view: any error inside
    /// the turn clears the conversation and yields the fixed restart reply.
    pub async fn respond_to(&self, user_text: &str) -> String {
        let mut state = self.state.lock().await;
        match self.run_turn(&mut state, user_text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "turn failed, clearing conversation");
                state.clear();
                RESTART_REPLY.to_string()
            }
        }
    }

    async fn run_turn(&self, state: &mut ConversationState, user_text: &str) -> Result<String> {
        let mut turn = self.generator.encode(user_text).await?;
        turn.push(self.generator.end_of_turn());

        let input = if state.is_empty() {
            turn
        } else {
            let mut joined = state.context.clone();
            joined.extend(turn);
            joined
        };
        let input = trim_context(input);

        let request = GenerationRequest::new(input);
        let sequence = self.generator.generate(&request).await?;

        let reply_ids = sequence.get(request.input_len()..).unwrap_or(&[]);
        let decoded = self.generator.decode(reply_ids).await?;
        let reply = decoded.trim().to_string();

        // The buffer becomes exactly what the model saw plus what it
        // returned, never a separately tracked log
        state.context = sequence;
        debug!(context_tokens = state.len(), "turn complete");

        if reply.is_empty() {
            let mut rng = rand::rng();
            let filler = FILLER_REPLIES
                .choose(&mut rng)
                .copied()
                .unwrap_or(FILLER_REPLIES[0]);
            return Ok(filler.to_string());
        }
        Ok(reply)
    }

    /// Drop all accumulated context; idempotent, always succeeds
    pub async fn reset(&self) {
        self.state.lock().await.clear();
        debug!("conversation history reset");
    }

    /// Current buffer length in tokens, for /status
    pub async fn context_tokens(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Display name of the generation model
    pub fn model_name(&self) -> String {
        self.generator.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BanterError;
    use crate::inference::MAX_CONTEXT_TOKENS;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Deterministic generator double: encodes one token per character,
    /// appends a fixed tail on generate, records what it was asked to do
    struct StubGenerator {
        generate_calls: AtomicUsize,
        last_input_len: AtomicUsize,
        fail_generate: AtomicBool,
        reply_tokens: Vec<TokenId>,
        decode_to: &'static str,
    }

    impl StubGenerator {
        fn new(reply_tokens: Vec<TokenId>, decode_to: &'static str) -> Self {
            Self {
                generate_calls: AtomicUsize::new(0),
                last_input_len: AtomicUsize::new(0),
                fail_generate: AtomicBool::new(false),
                reply_tokens,
                decode_to,
            }
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
            Ok(text.chars().map(|c| c as TokenId).collect())
        }

        async fn decode(&self, _tokens: &[TokenId]) -> Result<String> {
            Ok(self.decode_to.to_string())
        }

        fn end_of_turn(&self) -> TokenId {
            0
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<TokenId>> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.last_input_len.store(request.input_len(), Ordering::SeqCst);
            if self.fail_generate.load(Ordering::SeqCst) {
                return Err(BanterError::Inference("stub failure".into()));
            }
            let mut sequence = request.input_ids.clone();
            sequence.extend(&self.reply_tokens);
            Ok(sequence)
        }

        fn model_name(&self) -> String {
            "stub".to_string()
        }
    }

    fn manager_with(stub: Arc<StubGenerator>) -> TurnManager {
        TurnManager::new(stub)
    }

    #[tokio::test]
    async fn test_successful_turn_persists_full_sequence() {
        let stub = Arc::new(StubGenerator::new(vec![7, 8, 9], "  hi there  "));
        let turns = manager_with(stub.clone());

        let reply = turns.respond_to("abc").await;
        assert_eq!(reply, "hi there");
        // 3 chars + end-of-turn marker + 3 generated
        assert_eq!(turns.context_tokens().await, 7);
    }

    #[tokio::test]
    async fn test_second_turn_prepends_history() {
        let stub = Arc::new(StubGenerator::new(vec![7, 8, 9], "ok"));
        let turns = manager_with(stub.clone());

        turns.respond_to("abc").await;
        turns.respond_to("de").await;
        // history (7) + 2 chars + marker = 10
        assert_eq!(stub.last_input_len.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_generation_input_never_exceeds_budget() {
        let stub = Arc::new(StubGenerator::new(vec![1; 100], "ok"));
        let turns = manager_with(stub.clone());

        let long_text: String = "x".repeat(600);
        for _ in 0..6 {
            turns.respond_to(&long_text).await;
            assert!(stub.last_input_len.load(Ordering::SeqCst) <= MAX_CONTEXT_TOKENS);
        }
    }

    #[tokio::test]
    async fn test_over_budget_concat_is_trimmed_to_500() {
        let stub = Arc::new(StubGenerator::new(vec![1; 100], "ok"));
        let turns = manager_with(stub.clone());

        // First turn: 600 chars + marker = 601 input, +100 generated = 701 kept
        turns.respond_to(&"x".repeat(600)).await;
        // Second turn: 701 + 401 = 1102 > 1000, trimmed to trailing 500
        turns.respond_to(&"y".repeat(400)).await;
        assert_eq!(stub.last_input_len.load(Ordering::SeqCst), 500);
    }

    #[tokio::test]
    async fn test_failed_turn_clears_state_and_apologizes() {
        let stub = Arc::new(StubGenerator::new(vec![7, 8], "ok"));
        let turns = manager_with(stub.clone());

        turns.respond_to("abc").await;
        assert!(turns.context_tokens().await > 0);

        stub.fail_generate.store(true, Ordering::SeqCst);
        let reply = turns.respond_to("def").await;
        assert_eq!(reply, RESTART_REPLY);
        assert_eq!(turns.context_tokens().await, 0);

        // Next turn behaves exactly like a first-ever turn
        stub.fail_generate.store(false, Ordering::SeqCst);
        turns.respond_to("abc").await;
        assert_eq!(stub.last_input_len.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_decode_substitutes_filler() {
        let stub = Arc::new(StubGenerator::new(vec![7], "   "));
        let turns = manager_with(stub);

        let reply = turns.respond_to("abc").await;
        assert!(FILLER_REPLIES.contains(&reply.as_str()), "got: {reply}");
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let stub = Arc::new(StubGenerator::new(vec![7], "ok"));
        let turns = manager_with(stub);

        turns.respond_to("abc").await;
        turns.reset().await;
        assert_eq!(turns.context_tokens().await, 0);
        turns.reset().await;
        assert_eq!(turns.context_tokens().await, 0);
    }
}
