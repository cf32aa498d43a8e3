mod transcript;

pub use transcript::clean_transcription;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// The two kinds of stored outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    SpeechGeneration,
    SpeechRecognition,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::SpeechGeneration => "speech-generation",
            RecordKind::SpeechRecognition => "speech-recognition",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tts" | "speech-generation" => Ok(RecordKind::SpeechGeneration),
            "stt" | "speech-recognition" => Ok(RecordKind::SpeechRecognition),
            other => Err(format!(
                "unknown record kind '{}', expected 'tts' or 'stt'",
                other
            )),
        }
    }
}

/// Outcome of one successful synthesis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// The exact input text that was synthesized
    pub source_text: String,
    /// Decoded audio bytes (WAV)
    #[serde(with = "base64_bytes")]
    pub audio_data: Vec<u8>,
}

impl GenerationRecord {
    pub fn new(source_text: String, audio_data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source_text,
            audio_data,
        }
    }
}

/// Outcome of one successful recognition call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Unprocessed model output
    pub raw_transcription: String,
    /// Always derived locally from `raw_transcription`, never taken from the
    /// backend, so it is guaranteed free of code-fence marker lines
    pub cleaned_transcription: String,
    /// Backend-reported completion status
    pub finish_reason: String,
    /// Opaque backend-reported resource usage
    pub usage_metadata: serde_json::Value,
    /// Backend version identifier, e.g. "v1" or "v2"
    pub model_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// The original uploaded audio
    #[serde(with = "base64_bytes")]
    pub audio_data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_name: Option<String>,
}

impl RecognitionRecord {
    /// Build a recognition record, deriving `cleaned_transcription` from the
    /// raw text so the no-fence invariant holds for every backend version.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        raw_transcription: String,
        finish_reason: String,
        usage_metadata: serde_json::Value,
        model_version: String,
        confidence: Option<f64>,
        audio_data: Vec<u8>,
        source_file_name: Option<String>,
    ) -> Self {
        let cleaned_transcription = clean_transcription(&raw_transcription);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            raw_transcription,
            cleaned_transcription,
            finish_reason,
            usage_metadata,
            model_version,
            confidence,
            audio_data,
            source_file_name,
        }
    }
}

/// Canonical unit stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResultRecord {
    SpeechGeneration(GenerationRecord),
    SpeechRecognition(RecognitionRecord),
}

impl ResultRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            ResultRecord::SpeechGeneration(_) => RecordKind::SpeechGeneration,
            ResultRecord::SpeechRecognition(_) => RecordKind::SpeechRecognition,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ResultRecord::SpeechGeneration(r) => r.id,
            ResultRecord::SpeechRecognition(r) => r.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ResultRecord::SpeechGeneration(r) => r.created_at,
            ResultRecord::SpeechRecognition(r) => r.created_at,
        }
    }

    pub fn audio_data(&self) -> &[u8] {
        match self {
            ResultRecord::SpeechGeneration(r) => &r.audio_data,
            ResultRecord::SpeechRecognition(r) => &r.audio_data,
        }
    }

    /// The text a user associates with the record: the source text for
    /// synthesis, the cleaned transcription for recognition.
    pub fn display_text(&self) -> &str {
        match self {
            ResultRecord::SpeechGeneration(r) => &r.source_text,
            ResultRecord::SpeechRecognition(r) => &r.cleaned_transcription,
        }
    }
}

/// Audio payloads persist as base64 strings so the history blob stays valid
/// JSON and round-trips byte-identically.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
