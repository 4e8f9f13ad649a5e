//! Generative text backend.
//!
//! The translator only needs "prompt in, text out", so the backend is a small
//! trait. [`ChatCompletionsClient`] talks to any OpenAI-compatible chat
//! completions endpoint; tests substitute their own implementations.

pub mod client;

pub use client::ChatCompletionsClient;

use crate::error::PipelineResult;
use async_trait::async_trait;

/// A text completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete a single user prompt and return the raw response text.
    ///
    /// Transport failures, non-success statuses and empty responses are all
    /// `Backend` errors.
    async fn complete(&self, prompt: &str, temperature: f32, max_tokens: u32)
    -> PipelineResult<String>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
