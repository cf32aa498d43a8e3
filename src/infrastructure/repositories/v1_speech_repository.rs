use super::speech_repository::{AudioInput, SpeechRepository};
use super::{post_synthesis, unwrap_data_envelope, API_KEY_HEADER};
use crate::domain::language::LanguageCode;
use crate::domain::record::{GenerationRecord, RecognitionRecord};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};

const RECOGNIZE_PATH: &str = "/chat_generate";
const AUDIO_FIELD: &str = "chat_audio_input";
const METADATA_FIELD: &str = "request_data";

/// v1 backend: recognition goes through the original chat endpoint with its
/// chat-flavored field names and a fully populated response.
pub struct V1SpeechRepository {
    client: reqwest::Client,
    base_url: String,
}

impl V1SpeechRepository {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

/// Response shape of `POST /chat_generate`, possibly nested under `data`.
/// The backend also sends `transcription_clean`; it is deliberately not read
/// here, the cleaned text is always recomputed locally.
#[derive(Debug, Deserialize)]
struct V1RecognizeResponse {
    #[serde(default)]
    response_text: Option<String>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    usage_metadata: Option<Value>,
    #[serde(rename = "modelVersion", default)]
    model_version: Option<String>,
    #[serde(default)]
    transcription_raw: Option<String>,
}

#[async_trait]
impl SpeechRepository for V1SpeechRepository {
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
            "Calling v1 recognition endpoint"
        );

        let part = Part::bytes(audio.data.clone())
            .file_name(file_name.clone())
            .mime_str("audio/wav")
            .map_err(|e| AppError::Internal(format!("cannot build multipart body: {}", e)))?;
        let form = Form::new().part(AUDIO_FIELD, part).text(
            METADATA_FIELD,
            json!({ "target_language": language.as_str() }).to_string(),
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
            tracing::error!(status = %status, body = %body, "v1 recognition request rejected");
            return Err(AppError::request_failure(
                &file_name,
                format!("backend returned {}", status),
            ));
        }

        let payload: Value = response.json().await.map_err(|e| {
            AppError::request_failure(&file_name, format!("invalid response body: {}", e))
        })?;
        let body: V1RecognizeResponse = serde_json::from_value(unwrap_data_envelope(payload))
            .map_err(|e| {
                AppError::request_failure(&file_name, format!("unexpected response shape: {}", e))
            })?;

        // transcription = response_text on this version; the dedicated raw
        // field wins when both are present
        let raw = body
            .transcription_raw
            .or(body.response_text)
            .ok_or_else(|| {
                AppError::request_failure(&file_name, "response carries no transcription")
            })?;

        let record = RecognitionRecord::new(
            raw,
            body.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            body.usage_metadata.unwrap_or(Value::Null),
            body.model_version.unwrap_or_else(|| "v1".to_string()),
            None,
            audio.data.clone(),
            Some(file_name),
        );
        tracing::debug!(
            model_version = %record.model_version,
            finish_reason = %record.finish_reason,
            "v1 recognition completed"
        );
        Ok(record)
    }
}
