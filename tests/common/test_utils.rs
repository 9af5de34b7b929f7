use super::mocks::MockLlmClient;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use medscan_ai::{
    config::{LlmConfig, ModelRole},
    server::{
        self,
        handlers::{AppState, Models},
        uploads::UploadStore,
    },
};
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tempfile::TempDir;

pub const TEXT_MODEL: &str = "models/test-text";
pub const IMAGE_MODEL: &str = "models/test-image";
pub const BOUNDARY: &str = "medscan-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub mock: Arc<MockLlmClient>,
    pub uploads_dir: PathBuf,
    _temp_dir: TempDir,
}

/// LLM configuration pointing at the mock model ids
pub fn create_test_llm_config() -> LlmConfig {
    LlmConfig {
        api_key: Some("test-api-key".to_string()),
        text_model: TEXT_MODEL.to_string(),
        image_model: IMAGE_MODEL.to_string(),
        ..LlmConfig::default()
    }
}

pub fn create_test_app(mock: MockLlmClient) -> TestApp {
    create_test_app_with_self_test(mock, vec![ModelRole::Text, ModelRole::Image])
}

pub fn create_test_app_with_self_test(mock: MockLlmClient, self_test: Vec<ModelRole>) -> TestApp {
    build_test_app(mock, self_test, 1024 * 1024)
}

/// Test app whose request bodies are capped at `max_upload_bytes`
pub fn create_test_app_with_limit(mock: MockLlmClient, max_upload_bytes: usize) -> TestApp {
    build_test_app(mock, vec![ModelRole::Text, ModelRole::Image], max_upload_bytes)
}

fn build_test_app(
    mock: MockLlmClient,
    self_test: Vec<ModelRole>,
    max_upload_bytes: usize,
) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let uploads_dir = temp_dir.path().join("uploads");

    let mut config = create_test_llm_config();
    config.self_test = self_test;

    let mock = Arc::new(mock);
    let state = AppState {
        llm: mock.clone(),
        models: Models::from(&config),
        uploads: UploadStore::new(&uploads_dir),
    };

    TestApp {
        router: server::router(state, max_upload_bytes),
        mock,
        uploads_dir,
        _temp_dir: temp_dir,
    }
}

/// Builds a `multipart/form-data` body from `(name, filename, content)` parts
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

/// Files currently left in the uploads directory
pub fn leftover_uploads(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
