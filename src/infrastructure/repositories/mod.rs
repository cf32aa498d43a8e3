mod speech_repository;
mod v1_speech_repository;
mod v2_speech_repository;

pub use speech_repository::{AudioInput, SpeechRepository};
pub use v1_speech_repository::V1SpeechRepository;
pub use v2_speech_repository::V2SpeechRepository;

use crate::domain::language::LanguageCode;
use crate::domain::record::GenerationRecord;
use crate::error::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// Header carrying the user's API credential on every backend call
pub(crate) const API_KEY_HEADER: &str = "X-API-Key";

const SYNTHESIZE_PATH: &str = "/audio";
const WAV_DATA_URI_PREFIX: &str = "data:audio/wav;base64,";

/// The two incompatible recognition API shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
}

impl BackendVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendVersion::V1 => "v1",
            BackendVersion::V2 => "v2",
        }
    }
}

impl std::fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" => Ok(BackendVersion::V1),
            "v2" => Ok(BackendVersion::V2),
            other => Err(format!(
                "unknown backend version '{}', expected 'v1' or 'v2'",
                other
            )),
        }
    }
}

/// Owns one repository per backend version and selects one per call from an
/// explicit [`BackendVersion`], never from global state.
pub struct SpeechBackendSet {
    v1: Arc<dyn SpeechRepository>,
    v2: Arc<dyn SpeechRepository>,
}

impl SpeechBackendSet {
    pub fn new(v1: Arc<dyn SpeechRepository>, v2: Arc<dyn SpeechRepository>) -> Self {
        Self { v1, v2 }
    }

    /// Build the production set over the two HTTP base URLs, sharing one
    /// reqwest client.
    pub fn over_http(client: reqwest::Client, v1_base_url: String, v2_base_url: String) -> Self {
        Self::new(
            Arc::new(V1SpeechRepository::new(client.clone(), v1_base_url)),
            Arc::new(V2SpeechRepository::new(client, v2_base_url)),
        )
    }

    pub fn select(&self, version: BackendVersion) -> &dyn SpeechRepository {
        match version {
            BackendVersion::V1 => self.v1.as_ref(),
            BackendVersion::V2 => self.v2.as_ref(),
        }
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    audio: String,
}

/// `POST {base}/audio` — the synthesis wire shape is identical for both
/// backend versions, only the base URL differs, so both repositories share
/// this call.
pub(crate) async fn post_synthesis(
    client: &reqwest::Client,
    base_url: &str,
    language: LanguageCode,
    text: &str,
    api_key: &str,
) -> AppResult<GenerationRecord> {
    if text.trim().is_empty() {
        return Err(AppError::request_failure(text, "text is empty"));
    }

    let url = format!("{}{}", base_url, SYNTHESIZE_PATH);
    tracing::info!(
        url = %url,
        language = %language,
        text_length = text.len(),
        "Calling synthesis endpoint"
    );

    let response = client
        .post(&url)
        .header(API_KEY_HEADER, api_key)
        .json(&SynthesizeRequest {
            text,
            language: language.as_str(),
        })
        .send()
        .await
        .map_err(|e| AppError::request_failure(text, format!("transport error: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| String::new());
        tracing::error!(status = %status, body = %body, "Synthesis request rejected");
        return Err(AppError::request_failure(
            text,
            format!("backend returned {}", status),
        ));
    }

    let body: SynthesizeResponse = response
        .json()
        .await
        .map_err(|e| AppError::request_failure(text, format!("invalid response body: {}", e)))?;

    let audio_data =
        decode_audio_payload(&body.audio).map_err(|e| AppError::request_failure(text, e))?;
    if audio_data.is_empty() {
        return Err(AppError::request_failure(text, "empty audio payload"));
    }

    tracing::debug!(audio_size = audio_data.len(), "Synthesis audio decoded");
    Ok(GenerationRecord::new(text.to_string(), audio_data))
}

/// Decode the embedded audio payload, stripping the WAV data-URI prefix when
/// present.
pub(crate) fn decode_audio_payload(audio: &str) -> Result<Vec<u8>, String> {
    let encoded = audio.strip_prefix(WAV_DATA_URI_PREFIX).unwrap_or(audio);
    STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|e| format!("invalid base64 audio payload: {}", e))
}

/// Some backend deployments wrap the recognition payload in a `data`
/// envelope; unwrap it when it is there.
pub(crate) fn unwrap_data_envelope(mut value: Value) -> Value {
    if value.get("data").map_or(false, Value::is_object) {
        return value["data"].take();
    }
    value
}
