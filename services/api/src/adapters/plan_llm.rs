//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the reading-plan LLM.
//! It implements the `PlanGenerationService` port from the `core` crate,
//! requesting structured JSON output and parsing it into `PlannedStep`s.
//! Parse failures surface as `PortError::Malformed`; the core segmenter
//! answers those with its deterministic even split.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use book_scout_core::domain::{BookPlanSpec, PlannedStep, ReadingSpeedModel};
use book_scout_core::ports::{PlanGenerationService, PortError, PortResult};
use serde::Deserialize;

/// The JSON envelope the backend is instructed to produce.
#[derive(Debug, Deserialize)]
struct PlanPayload {
    #[serde(default)]
    steps: Vec<PlannedStep>,
}

/// An adapter that implements `PlanGenerationService` using an
/// OpenAI-compatible completion backend.
#[derive(Clone)]
pub struct CompletionPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl CompletionPlanAdapter {
    /// Creates a new `CompletionPlanAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn system_prompt(book: &BookPlanSpec, model: &ReadingSpeedModel) -> String {
        let merge_below = model.pages_per_session / 2;
        let split_above = model.pages_per_session + model.pages_per_session / 2;
        format!(
            r#"Eres un asistente literario especializado en crear planes de lectura personalizados.
Debes crear un plan de lectura estructurado para el libro "{title}" de {author}.
El libro tiene {total} páginas.
El usuario dispone de {minutes} minutos diarios y lee unas {pps} páginas por sesión
(velocidad estimada: {ppm} página(s) por minuto). Número estimado de días: {days}.

IMPORTANTE: responde SOLO con un JSON válido con este formato, sin texto adicional:
{{
  "steps": [
    {{
      "id": "step_1",
      "title": "Título de la etapa",
      "description": "Qué leer en esta etapa",
      "pages": "1-{pps}",
      "estimatedMinutes": {minutes_per_step}
    }}
  ]
}}

REGLAS PARA DIVIDIR EL LIBRO:
1. Cada etapa debe abarcar aproximadamente {pps} páginas (lo que cabe en {minutes} minutos).
2. El número total de etapas debe rondar {days} (una etapa por día).
3. Respeta divisiones naturales por capítulos o secciones temáticas.
4. Si un capítulo supera {split_above} páginas, divídelo en varias etapas.
5. Si un capítulo tiene menos de {merge_below} páginas, combínalo con el siguiente.
6. Los rangos "pages" deben cubrir de la página 1 a la {total}, consecutivos, sin huecos ni solapamientos.
7. "estimatedMinutes" debe reflejar el tiempo real de lectura de esas páginas a {ppm} página(s) por minuto."#,
            title = book.title,
            author = book.author,
            total = book.total_pages,
            minutes = model.minutes_per_session,
            pps = model.pages_per_session,
            ppm = model.pages_per_minute,
            days = model.estimated_days,
            minutes_per_step = model.minutes_per_session,
            split_above = split_above,
            merge_below = merge_below,
        )
    }
}

#[async_trait]
impl PlanGenerationService for CompletionPlanAdapter {
    async fn generate_steps(
        &self,
        book: &BookPlanSpec,
        model: &ReadingSpeedModel,
    ) -> PortResult<Vec<PlannedStep>> {
        let user = format!(
            "Crea un plan de lectura para \"{}\" de {} ({} páginas), dividido en etapas que \
             respeten la capacidad de lectura diaria del usuario.",
            book.title, book.author, book.total_pages
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::system_prompt(book, model))
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
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Malformed("plan completion contained no text content".to_string())
            })?;

        let payload: PlanPayload = serde_json::from_str(&content)
            .map_err(|e| PortError::Malformed(format!("plan JSON did not parse: {e}")))?;
        if payload.steps.is_empty() {
            return Err(PortError::Malformed("plan JSON contained no steps".into()));
        }
        Ok(payload.steps)
    }
}
