use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::GeneratorError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// One call to an external text generator
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Opaque `provider/model` identifier
    pub model: String,
    pub prompt: String,
    /// JSON Schema of the expected output
    pub schema: Value,
    pub params: GenerationParams,
}

/// What a generator handed back: parsed JSON, or text that was not JSON
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Structured(Value),
    RawText(String),
}

impl GenerationOutput {
    /// Parse model text, tolerating Markdown code fences around the JSON.
    /// Returns `None` for blank text.
    pub fn from_text(text: &str) -> Option<Self> {
        let trimmed = strip_code_fence(text.trim());
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::String(inner)) => Self::from_text(&inner),
            Ok(Value::Null) => None,
            Ok(value) => Some(GenerationOutput::Structured(value)),
            Err(_) => Some(GenerationOutput::RawText(trimmed.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GenerationOutput::Structured(Value::Object(map)) => map.is_empty(),
            GenerationOutput::Structured(Value::Null) => true,
            GenerationOutput::Structured(_) => false,
            GenerationOutput::RawText(text) => text.trim().is_empty(),
        }
    }

    /// Deserialize the output into `T`; raw text gets one more JSON parse attempt
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            GenerationOutput::Structured(value) => T::deserialize(value),
            GenerationOutput::RawText(text) => serde_json::from_str(text),
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag line, e.g. ```json
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// An external structured text generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one request against `request.model`. `Ok(None)` means the provider
    /// answered without any output.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<GenerationOutput>, GeneratorError>;
}
