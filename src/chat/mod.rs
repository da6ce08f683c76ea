// src/chat/mod.rs
// Conversation handling: the turn manager and canned short-circuit replies

mod quick;
mod turn;

pub use quick::quick_reply;
pub use turn::{ConversationState, TurnManager, RESTART_REPLY, UNAVAILABLE_REPLY};
