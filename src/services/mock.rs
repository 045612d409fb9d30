use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use log::info;
use serde_json::Value;

use crate::error::GeneratorError;
use crate::services::generator::{GenerationOutput, GenerationRequest, TextGenerator};

/// A scripted reply for one call to a model
#[derive(Debug, Clone)]
pub enum Scripted {
    Json(Value),
    Text(String),
    Nothing,
    Fail(String),
    /// Never resolves; only a timeout gets the caller out
    Hang,
}

/// A `TextGenerator` that replays canned replies per model, for tests and
/// offline development. Models without a script fail as not found.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `model`. The last queued reply repeats once the queue drains.
    pub fn on(self, model: &str, reply: Scripted) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(model.to_string()).or_default().push_back(reply);
        }
        self
    }

    /// Models called so far, in order
    pub fn called_models(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|c| c.model.clone()).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn next_reply(&self, model: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().ok()?;
        let queue = scripts.get_mut(model)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<GenerationOutput>, GeneratorError> {
        info!("ScriptedGenerator: call for model {}", request.model);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        match self.next_reply(&request.model) {
            None => Err(GeneratorError::UnknownProvider(request.model.clone())),
            Some(Scripted::Json(value)) => Ok(Some(GenerationOutput::Structured(value))),
            Some(Scripted::Text(text)) => Ok(GenerationOutput::from_text(&text)),
            Some(Scripted::Nothing) => Ok(None),
            Some(Scripted::Fail(message)) => Err(GeneratorError::Provider(message)),
            Some(Scripted::Hang) => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}
