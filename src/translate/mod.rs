//! Question to SQL translation.
//!
//! Two strategies exist and one is chosen at construction: the keyword
//! heuristic when no backend credential is configured, the generative
//! translator otherwise. A failing backend is never replaced by the heuristic.

pub mod generative;
pub mod heuristic;
pub mod prompt;

pub use generative::GenerativeTranslator;
pub use heuristic::HeuristicTranslator;

use crate::config::Config;
use crate::error::PipelineResult;
use crate::llm::{ChatCompletionsClient, CompletionBackend};
use crate::models::{CandidateQuery, Question, SchemaDescription};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub enum Translator {
    Heuristic(HeuristicTranslator),
    Generative(GenerativeTranslator),
}

impl Translator {
    /// Select the strategy from the configured credential.
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        match config.backend_credential() {
            None => {
                info!("No backend credential configured, using keyword heuristic");
                Ok(Self::heuristic())
            }
            Some(key) => {
                let client = ChatCompletionsClient::new(
                    key,
                    &config.llm_base_url,
                    &config.llm_model,
                    config.backend_timeout_duration(),
                )?;
                info!(
                    model = %config.llm_model,
                    endpoint = %client.endpoint(),
                    "Using generative translator"
                );
                Ok(Self::generative(
                    Arc::new(client),
                    config.temperature,
                    config.max_tokens,
                ))
            }
        }
    }

    pub fn heuristic() -> Self {
        Self::Heuristic(HeuristicTranslator::new())
    }

    pub fn generative(
        backend: Arc<dyn CompletionBackend>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self::Generative(GenerativeTranslator::new(backend, temperature, max_tokens))
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Heuristic(_) => "heuristic",
            Self::Generative(_) => "generative",
        }
    }

    /// Produce one candidate statement for the question.
    pub async fn translate(
        &self,
        question: &Question,
        schema: &SchemaDescription,
    ) -> PipelineResult<CandidateQuery> {
        match self {
            Self::Heuristic(t) => Ok(t.translate(question)),
            Self::Generative(t) => t.translate(question, schema).await,
        }
    }
}
