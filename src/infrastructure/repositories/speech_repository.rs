use crate::domain::language::LanguageCode;
use crate::domain::record::{GenerationRecord, RecognitionRecord};
use crate::error::AppResult;
use async_trait::async_trait;

/// One audio file submitted for recognition.
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl AudioInput {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }
}

/// Repository for speech synthesis and recognition operations.
/// Abstracts the backend API version so the batch loop sees one contract
/// regardless of which version is targeted.
///
/// Implementations are responsible for:
/// - Version-specific request encoding (field names, metadata JSON shape)
/// - Normalizing the version-specific response into the canonical records,
///   synthesizing fields the backend does not report
/// - Recomputing the cleaned transcription locally in every case
#[async_trait]
pub trait SpeechRepository: Send + Sync {
    /// Synthesize one text to speech.
    ///
    /// The backend does not support batched synthesis; exactly one call is
    /// issued for exactly this text.
    ///
    /// # Errors
    /// `AppError::RequestFailure` carrying the original text on transport
    /// failure or non-success response. No retries are performed.
    async fn synthesize(
        &self,
        language: LanguageCode,
        text: &str,
        api_key: &str,
    ) -> AppResult<GenerationRecord>;

    /// Transcribe one audio file.
    ///
    /// # Errors
    /// `AppError::RequestFailure` carrying the originating file name on
    /// transport failure or non-success response. No retries are performed.
    async fn recognize(
        &self,
        language: LanguageCode,
        audio: &AudioInput,
        api_key: &str,
    ) -> AppResult<RecognitionRecord>;
}
