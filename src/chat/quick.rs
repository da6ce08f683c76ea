// src/chat/quick.rs
// Canned short-circuit replies, answered without touching the conversation

use chrono::{Local, Timelike};
use rand::seq::IndexedRandom;

/// Any of these words anywhere in the message means a clock question
const TIME_KEYWORDS: [&str; 4] = ["time", "date", "day", "clock"];

/// Exact greetings (after trim + lowercase)
const GREETING_WORDS: [&str; 5] = ["hi", "hello", "hey", "howdy", "greetings"];

const HOW_ARE_YOU_REPLIES: [&str; 4] = [
    "I'm doing great, thanks for asking! How about you?",
    "Pretty good! Just here chatting with nice people like you. How's your day going?",
    "I'm wonderful! Thanks for asking. What's on your mind today?",
    "Can't complain! How are things with you?",
];

/// Intercept the three special query patterns. Returns None for everything
/// that should reach the turn manager.
pub fn quick_reply(message: &str) -> Option<String> {
    let lowered = message.to_lowercase();

    if TIME_KEYWORDS.iter().any(|word| lowered.contains(word)) {
        return Some(format!("It's {}. {}", current_time(), greeting()));
    }

    if GREETING_WORDS.contains(&lowered.trim()) {
        return Some(format!("{} How are you doing today?", greeting()));
    }

    if lowered.contains("how are you") {
        let mut rng = rand::rng();
        return HOW_ARE_YOU_REPLIES.choose(&mut rng).map(|r| r.to_string());
    }

    None
}

/// Greeting banded by local hour
pub fn greeting() -> &'static str {
    greeting_for_hour(Local::now().hour())
}

fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning!",
        12..=17 => "Good afternoon!",
        18..=21 => "Good evening!",
        _ => "Hello!",
    }
}

fn current_time() -> String {
    Local::now().format("%A, %B %d, %Y at %I:%M %p").to_string()
}
