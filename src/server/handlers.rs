use super::types::{AnalysisResponse, AnalyzeRequest, HealthResponse, SelfTestResponse};
use super::uploads::{StoredUpload, UploadStore, sanitize_filename};
use crate::{
    Error, Result,
    config::{LlmConfig, ModelRole},
    llm::LlmClient,
    prompts,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Json,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

pub const GREETING: &str = "MedScan AI Backend Running";
pub const NO_SYMPTOMS: &str = "No symptoms provided";
pub const NO_FILE_PART: &str = "No file part in the request";
pub const NO_SELECTED_FILE: &str = "No selected file";
pub const INVALID_FILE_NAME: &str = "Invalid file name";
pub const NO_SELF_TEST_MODELS: &str = "No models configured for self-test";

const EXCERPT_CHARS: usize = 500;
const UPLOAD_FIELD: &str = "file";

/// Model identifiers resolved at startup.
#[derive(Debug, Clone)]
pub struct Models {
    pub text: String,
    pub image: String,
    pub self_test: Vec<ModelRole>,
}

impl Models {
    pub fn for_role(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Text => &self.text,
            ModelRole::Image => &self.image,
        }
    }
}

impl From<&LlmConfig> for Models {
    fn from(config: &LlmConfig) -> Self {
        Self {
            text: config.model_for(ModelRole::Text).to_string(),
            image: config.model_for(ModelRole::Image).to_string(),
            self_test: config.self_test.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub models: Models,
    pub uploads: UploadStore,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: GREETING.to_string(),
    })
}

pub async fn test_model(State(state): State<AppState>) -> (StatusCode, Json<SelfTestResponse>) {
    if state.models.self_test.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SelfTestResponse {
                ok: false,
                error: Some(NO_SELF_TEST_MODELS.to_string()),
                ..Default::default()
            }),
        );
    }

    let mut errors = BTreeMap::new();
    for &role in &state.models.self_test {
        let model = state.models.for_role(role);
        let prompt = match role {
            ModelRole::Text => prompts::SELF_TEST_TEXT,
            ModelRole::Image => prompts::SELF_TEST_IMAGE,
        };

        match state.llm.generate_text(model, prompt).await {
            Ok(text) => {
                info!(model = %model, "Model self-test succeeded");
                return (
                    StatusCode::OK,
                    Json(SelfTestResponse {
                        ok: true,
                        model: Some(model.to_string()),
                        text: Some(excerpt(&text)),
                        ..Default::default()
                    }),
                );
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Model self-test failed");
                errors.insert(role.label().to_string(), e.client_message());
            }
        }
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SelfTestResponse {
            ok: false,
            errors: Some(errors),
            ..Default::default()
        }),
    )
}

pub async fn analyze(State(state): State<AppState>, body: Bytes) -> Result<Json<AnalysisResponse>> {
    // Parsed by hand so a missing or wrong Content-Type is still accepted.
    let request: AnalyzeRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::validation(format!("Invalid JSON body: {}", e)))?;

    let symptoms = request.symptoms.as_deref().unwrap_or_default().trim();
    if symptoms.is_empty() {
        return Err(Error::validation(NO_SYMPTOMS));
    }

    info!(
        chars = symptoms.chars().count(),
        "Received symptom analysis request"
    );

    let prompt = prompts::symptom_analysis(symptoms);
    let analysis = state.llm.generate_text(&state.models.text, &prompt).await?;

    Ok(Json(AnalysisResponse { analysis }))
}

pub async fn scan_report(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>> {
    // Not a multipart body at all: there is no file part to find.
    let mut multipart = multipart.map_err(|_| Error::validation(NO_FILE_PART))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // A plain form value named `file` is not a file part.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(Error::validation(NO_SELECTED_FILE));
        }
        upload = Some((filename, field.bytes().await?));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| Error::validation(NO_FILE_PART))?;
    let safe_name = sanitize_filename(&filename);
    if safe_name.is_empty() {
        return Err(Error::validation(INVALID_FILE_NAME));
    }

    info!(file = %safe_name, bytes = data.len(), "Received report scan request");

    let stored = state.uploads.save(&safe_name, &data).await?;
    let result = analyze_upload(&state, &stored).await;
    stored.remove().await;

    Ok(Json(AnalysisResponse { analysis: result? }))
}

async fn analyze_upload(state: &AppState, upload: &StoredUpload) -> Result<String> {
    let file = upload.encode().await?;
    state
        .llm
        .generate_with_file(&state.models.image, prompts::REPORT_SCAN, file)
        .await
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let text = "é".repeat(600);
        let short = excerpt(&text);
        assert_eq!(short.chars().count(), 500);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_models_from_config() {
        let config = LlmConfig::default();
        let models = Models::from(&config);
        assert_eq!(models.for_role(ModelRole::Text), "models/gemini-2.5-flash");
        assert_eq!(
            models.for_role(ModelRole::Image),
            "models/gemini-2.5-flash-image-preview"
        );
        assert_eq!(models.self_test, vec![ModelRole::Text, ModelRole::Image]);
    }
}
