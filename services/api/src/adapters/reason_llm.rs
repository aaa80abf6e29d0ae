//! services/api/src/adapters/reason_llm.rs
//!
//! This module contains the adapter for the recommendation-reason LLM.
//! It implements the `ReasonGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use book_scout_core::domain::{CatalogItem, InterestTag};
use book_scout_core::interests::InterestVocabulary;
use book_scout_core::ports::{PortError, PortResult, ReasonGenerationService};

const MATCHING_PROMPT: &str = "Eres un asistente literario. El libro coincide con los intereses \
del usuario. Escribe en español, en máximo 2 líneas, por qué este libro encaja con esos \
intereses, mencionando el título o el género. Tono cercano y amable, sin listas.";

const NON_MATCHING_PROMPT: &str = "Eres un asistente literario. El libro NO coincide con los \
intereses guardados del usuario. Escribe en español, en máximo 2 líneas, una invitación amable \
a descubrirlo igualmente, apoyándote en el título, el autor o la descripción. Sin listas.";

/// How much of the catalog description travels with the prompt.
const DESCRIPTION_EXCERPT_CHARS: usize = 300;

/// An adapter that implements `ReasonGenerationService` using an
/// OpenAI-compatible completion backend.
#[derive(Clone)]
pub struct CompletionReasonAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl CompletionReasonAdapter {
    /// Creates a new `CompletionReasonAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ReasonGenerationService for CompletionReasonAdapter {
    async fn recommendation_reason(
        &self,
        item: &CatalogItem,
        interests: &[InterestTag],
    ) -> PortResult<String> {
        let system = if item.matches_interests {
            MATCHING_PROMPT
        } else {
            NON_MATCHING_PROMPT
        };

        let excerpt: String = item
            .description
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(DESCRIPTION_EXCERPT_CHARS)
            .collect();
        let terms = InterestVocabulary::terms_for(interests).join(", ");
        let user = format!(
            "Libro: {} de {}\nGénero: {}\nDescripción: {}\nIntereses del usuario: {}",
            item.title,
            item.author,
            item.genre.as_deref().unwrap_or("desconocido"),
            excerpt,
            terms,
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(120u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                PortError::Malformed("reason completion contained no text content".to_string())
            })
    }
}
