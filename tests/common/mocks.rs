use async_trait::async_trait;
use medscan_ai::{
    Error, Result,
    llm::{LlmClient, ModelInfo, Part},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A recorded `generate_content` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub parts: Vec<Part>,
}

/// Mock LLM client answering per model id
#[derive(Debug, Default)]
pub struct MockLlmClient {
    pub replies: HashMap<String, std::result::Result<String, String>>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, model: &str, text: &str) -> Self {
        self.replies
            .insert(model.to_string(), Ok(text.to_string()));
        self
    }

    pub fn with_error(mut self, model: &str, error: &str) -> Self {
        self.replies
            .insert(model.to_string(), Err(error.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate_content(&self, model: &str, parts: Vec<Part>) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            parts,
        });

        match self.replies.get(model) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(error)) => Err(Error::upstream(error.clone())),
            None => Err(Error::upstream(format!("Unknown model: {}", model))),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(Vec::new())
    }
}
