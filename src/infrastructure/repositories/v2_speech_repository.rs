use super::speech_repository::{AudioInput, SpeechRepository};
use super::{post_synthesis, unwrap_data_envelope, API_KEY_HEADER};
use crate::domain::language::LanguageCode;
use crate::domain::record::{GenerationRecord, RecognitionRecord};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};

const RECOGNIZE_PATH: &str = "/stt";
const AUDIO_FIELD: &str = "audio";
const METADATA_FIELD: &str = "request_data";

/// Completion status synthesized for every v2 result; the backend does not
/// report one.
const DEFAULT_FINISH_REASON: &str = "completed";
const MODEL_VERSION: &str = "v2";

/// v2 backend: a dedicated STT endpoint with a slimmer response; the missing
/// fields are synthesized here so both versions produce the same record.
pub struct V2SpeechRepository {
    client: reqwest::Client,
    base_url: String,
}

impl V2SpeechRepository {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

/// Response shape of `POST /stt`, possibly nested under `data`.
#[derive(Debug, Deserialize)]
struct V2RecognizeResponse {
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    usage_metadata: Option<Value>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[async_trait]
impl SpeechRepository for V2SpeechRepository {
    async fn synthesize(
        &self,
        language: LanguageCode,
        text: &str,
        api_key: &str,
    ) -> AppResult<GenerationRecord> {
        post_synthesis(&self.client, &self.base_url, language, text, api_key).await
    }

    async fn recognize(
        &self,
        language: LanguageCode,
        audio: &AudioInput,
        api_key: &str,
    ) -> AppResult<RecognitionRecord> {
        let file_name = audio.file_name.clone();
        let url = format!("{}{}", self.base_url, RECOGNIZE_PATH);
        tracing::info!(
            url = %url,
            file_name = %file_name,
            audio_size = audio.data.len(),
            language = %language,
            "Calling v2 recognition endpoint"
        );

        let part = Part::bytes(audio.data.clone())
            .file_name(file_name.clone())
            .mime_str("audio/wav")
            .map_err(|e| AppError::Internal(format!("cannot build multipart body: {}", e)))?;
        let form = Form::new().part(AUDIO_FIELD, part).text(
            METADATA_FIELD,
            json!({ "language_code": language.as_str() }).to_string(),
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AppError::request_failure(&file_name, format!("transport error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            tracing::error!(status = %status, body = %body, "v2 recognition request rejected");
            return Err(AppError::request_failure(
                &file_name,
                format!("backend returned {}", status),
            ));
        }

        let payload: Value = response.json().await.map_err(|e| {
            AppError::request_failure(&file_name, format!("invalid response body: {}", e))
        })?;
        let body: V2RecognizeResponse = serde_json::from_value(unwrap_data_envelope(payload))
            .map_err(|e| {
                AppError::request_failure(&file_name, format!("unexpected response shape: {}", e))
            })?;

        let raw = body.transcription.ok_or_else(|| {
            AppError::request_failure(&file_name, "response carries no transcription")
        })?;

        let record = RecognitionRecord::new(
            raw,
            DEFAULT_FINISH_REASON.to_string(),
            body.usage_metadata.unwrap_or(Value::Null),
            MODEL_VERSION.to_string(),
            body.confidence,
            audio.data.clone(),
            Some(file_name),
        );
        tracing::debug!(
            confidence = ?record.confidence,
            "v2 recognition completed"
        );
        Ok(record)
    }
}
