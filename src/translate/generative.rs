//! Backend-driven translator.

use super::prompt::build_prompt;
use crate::error::PipelineResult;
use crate::llm::CompletionBackend;
use crate::models::{CandidateQuery, Question, SchemaDescription};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct GenerativeTranslator {
    backend: Arc<dyn CompletionBackend>,
    temperature: f32,
    max_tokens: u32,
}

impl GenerativeTranslator {
    pub fn new(backend: Arc<dyn CompletionBackend>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            backend,
            temperature,
            max_tokens,
        }
    }

    /// Ask the backend for a statement.
    ///
    /// The response is trimmed and otherwise passed through untouched; a
    /// fenced or chatty answer is left for the validator and database to refuse.
    pub async fn translate(
        &self,
        question: &Question,
        schema: &SchemaDescription,
    ) -> PipelineResult<CandidateQuery> {
        let prompt = build_prompt(&question.question, schema);
        let raw = self
            .backend
            .complete(&prompt, self.temperature, self.max_tokens)
            .await?;

        debug!(backend = self.backend.name(), response_len = raw.len(), "Backend responded");
        Ok(CandidateQuery::generated(raw.trim()))
    }
}

impl std::fmt::Debug for GenerativeTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeTranslator")
            .field("backend", &self.backend.name())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
