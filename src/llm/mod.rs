//! Chat-completion integration.
//!
//! Defines the thin `ChatModel` trait and the Anthropic implementation.
//! The engine uses it for one thing: turning a ranked pick list into a
//! short announcement-channel recap.

pub mod anthropic;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::ConsensusPick;

/// A completed chat response with usage accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub tokens_used: u32,
    /// Approximate API cost in USD.
    pub cost: f64,
}

/// Abstraction over chat-completion providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system + user turn and return the model's reply.
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion>;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}

const RECAP_SYSTEM: &str = "You write one-paragraph daily recaps for a sports \
    betting picks channel. Plain language, two or three sentences, no emojis, \
    and never promise that a bet will win.";

/// Ask the model for a short recap of today's board.
pub async fn write_recap(model: &dyn ChatModel, picks: &[ConsensusPick]) -> Result<String> {
    let mut prompt = String::from("Today's consensus board:\n");
    for pick in picks {
        prompt.push_str(&format!("- {pick}\n"));
    }
    prompt.push_str("\nWrite the daily recap.");

    let completion = model.complete(RECAP_SYSTEM, &prompt).await?;
    Ok(completion.text.trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
