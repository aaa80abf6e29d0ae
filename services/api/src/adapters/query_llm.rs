//! services/api/src/adapters/query_llm.rs
//!
//! This module contains the adapter for the query-understanding LLM.
//! It implements the `QueryRefinementService` port from the `core` crate.

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
use book_scout_core::domain::InterestTag;
use book_scout_core::interests::InterestVocabulary;
use book_scout_core::ports::{PortError, PortResult, QueryRefinementService};

const KEYWORDS_SPECIFIC_PROMPT: &str = "Eres un extractor de términos de búsqueda para un \
catálogo de libros. Del mensaje del usuario, extrae como máximo 10 palabras clave de búsqueda \
separadas por espacios. IGNORA por completo los intereses guardados del usuario: usa solo lo \
que pide este mensaje. Responde ÚNICAMENTE con las palabras clave, sin comillas, sin \
explicaciones y sin puntuación adicional.";

const KEYWORDS_GENERIC_PROMPT: &str = "Eres un extractor de términos de búsqueda para un \
catálogo de libros. Del mensaje del usuario y de sus intereses, extrae como máximo 10 palabras \
clave de búsqueda separadas por espacios. Responde ÚNICAMENTE con las palabras clave, sin \
comillas y sin explicaciones.";

const TOPIC_PROMPT: &str = "El usuario mencionó libros sin concretar qué busca. Infiere el tema \
más probable de su mensaje y responde ÚNICAMENTE con una frase corta (máximo 5 palabras) que \
pueda completar la pregunta «¿Te gustaría ver libros sobre …?». Sin comillas ni explicaciones.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QueryRefinementService` using an
/// OpenAI-compatible completion backend.
#[derive(Clone)]
pub struct CompletionQueryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl CompletionQueryAdapter {
    /// Creates a new `CompletionQueryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn complete(&self, system: &str, user: String) -> PortResult<String> {
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
            .temperature(0.3)
            .max_tokens(60u32)
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
                PortError::Malformed("completion response contained no text content".to_string())
            })
    }
}

//=========================================================================================
// `QueryRefinementService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QueryRefinementService for CompletionQueryAdapter {
    async fn extract_keywords(
        &self,
        message: &str,
        interests: &[InterestTag],
        is_generic: bool,
    ) -> PortResult<String> {
        let (system, user) = if is_generic {
            let terms = InterestVocabulary::terms_for(interests).join(", ");
            (
                KEYWORDS_GENERIC_PROMPT,
                format!("Mensaje: {message}\nIntereses del usuario: {terms}"),
            )
        } else {
            (KEYWORDS_SPECIFIC_PROMPT, format!("Mensaje: {message}"))
        };
        self.complete(system, user).await
    }

    async fn infer_topic(&self, message: &str) -> PortResult<String> {
        self.complete(TOPIC_PROMPT, format!("Mensaje: {message}"))
            .await
    }
}
