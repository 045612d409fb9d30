use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::GeneratorError;
use crate::services::generator::{GenerationOutput, GenerationParams, GenerationRequest, TextGenerator};

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    OpenAi,
    Google,
}

/// Split a `provider/model` identifier
fn split_model(id: &str) -> Result<(Provider, &str), GeneratorError> {
    match id.split_once('/') {
        Some(("openai", model)) if !model.is_empty() => Ok((Provider::OpenAi, model)),
        Some(("googleai", model)) if !model.is_empty() => Ok((Provider::Google, model)),
        _ => Err(GeneratorError::UnknownProvider(id.to_string())),
    }
}

/// Prompt text plus the output shape the answer must follow
fn with_schema(prompt: &str, schema: &Value) -> String {
    format!(
        "{}\n\nRespond with a single JSON object matching this JSON Schema:\n{}",
        prompt, schema
    )
}

// --- OpenAI ---

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

fn parse_openai(text: &str) -> Result<Option<String>, GeneratorError> {
    let resp: OpenAiResponse = serde_json::from_str(text)
        .map_err(|e| GeneratorError::Decode(format!("{} | Raw: {}", e, truncate(text))))?;
    let Some(choice) = resp.choices.into_iter().next() else {
        return Ok(None);
    };
    if let Some(refusal) = choice.message.refusal {
        return Err(GeneratorError::Provider(format!("model refused: {}", refusal)));
    }
    Ok(choice.message.content)
}

// --- Google generative language ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

fn parse_gemini(text: &str) -> Result<Option<String>, GeneratorError> {
    let resp: GeminiResponse = serde_json::from_str(text)
        .map_err(|e| GeneratorError::Decode(format!("{} | Raw: {}", e, truncate(text))))?;
    let joined: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    Ok(if joined.is_empty() { None } else { Some(joined) })
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY).collect()
}

/// Talks to OpenAI and Google generative language endpoints over HTTPS,
/// choosing the provider from the model identifier's prefix.
pub struct HttpTextGenerator {
    client: Client,
    openai_base_url: String,
    openai_key: Option<String>,
    google_base_url: String,
    google_key: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: Client::new(),
            openai_base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            openai_key: config.api_keys.openai.clone(),
            google_base_url: config.google_base_url.trim_end_matches('/').to_string(),
            google_key: config.api_keys.google.clone(),
        }
    }

    fn openai_request(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<RequestBuilder, GeneratorError> {
        let key = self.openai_key.as_deref().ok_or(GeneratorError::MissingApiKey("openai"))?;
        let body = OpenAiRequest {
            model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
            top_p: params.top_p,
            response_format: ResponseFormat { type_: "json_object" },
        };
        Ok(self
            .client
            .post(format!("{}/chat/completions", self.openai_base_url))
            .bearer_auth(key)
            .json(&body))
    }

    fn gemini_request(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<RequestBuilder, GeneratorError> {
        let key = self.google_key.as_deref().ok_or(GeneratorError::MissingApiKey("googleai"))?;
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
                top_p: params.top_p,
                response_mime_type: "application/json",
            },
        };
        Ok(self
            .client
            .post(format!("{}/models/{}:generateContent", self.google_base_url, model))
            .header("x-goog-api-key", key)
            .json(&body))
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<GenerationOutput>, GeneratorError> {
        let (provider, model) = split_model(&request.model)?;
        let prompt = with_schema(&request.prompt, &request.schema);
        let builder = match provider {
            Provider::OpenAi => self.openai_request(model, &prompt, &request.params)?,
            Provider::Google => self.gemini_request(model, &prompt, &request.params)?,
        };

        debug!("Sending generation request to {}", request.model);
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body: truncate(&text),
            });
        }

        let content = match provider {
            Provider::OpenAi => parse_openai(&text)?,
            Provider::Google => parse_gemini(&text)?,
        };
        Ok(content.and_then(|c| GenerationOutput::from_text(&c)))
    }
}
