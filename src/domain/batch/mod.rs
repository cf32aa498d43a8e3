use crate::domain::history::HistoryStore;
use crate::domain::language::LanguageCode;
use crate::domain::record::ResultRecord;
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{
    AudioInput, BackendVersion, SpeechBackendSet, SpeechRepository,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Longest input prefix quoted in failure notices and logs
const SNIPPET_CHARS: usize = 40;

/// Cooperative cancellation handle, polled only at loop-iteration
/// boundaries. An already-dispatched backend call is always allowed to
/// complete or fail normally.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Cancelling,
}

/// One failed item: the identifying value of the input plus the reason.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub input: String,
    pub reason: String,
}

/// What a finished run produced. A batch of N items yields between 0 and N
/// records plus a failure notice for each item that did not make it.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub completed: usize,
    pub failures: Vec<BatchFailure>,
    pub cancelled: bool,
}

/// Drives an ordered list of homogeneous inputs through the selected speech
/// repository, strictly one at a time, prepending each successful result to
/// the history store as it completes.
///
/// Sequential processing is deliberate: cancellation gets a precise boundary
/// between items and records land in history in submission order.
pub struct BatchService {
    backends: Arc<SpeechBackendSet>,
    history: Arc<Mutex<HistoryStore>>,
    state: Mutex<BatchState>,
}

impl BatchService {
    pub fn new(backends: Arc<SpeechBackendSet>, history: Arc<Mutex<HistoryStore>>) -> Self {
        Self {
            backends,
            history,
            state: Mutex::new(BatchState::Idle),
        }
    }

    pub fn state(&self) -> BatchState {
        self.state.lock().map(|s| *s).unwrap_or(BatchState::Idle)
    }

    /// Synthesize each text in order. Blank texts are dropped up front, the
    /// way the original submission form filtered them.
    pub async fn run_synthesis(
        &self,
        texts: Vec<String>,
        language: LanguageCode,
        version: BackendVersion,
        api_key: &str,
        token: &CancellationToken,
    ) -> AppResult<BatchOutcome> {
        let texts: Vec<String> = texts
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        self.begin(api_key, texts.len(), token)?;

        let repo = self.backends.select(version);
        let mut outcome = BatchOutcome::default();
        let result: AppResult<()> = async {
            for text in &texts {
                if self.observe_cancellation(token) {
                    outcome.cancelled = true;
                    break;
                }
                match repo.synthesize(language, text, api_key).await {
                    Ok(record) => {
                        self.commit(ResultRecord::SpeechGeneration(record))?;
                        outcome.completed += 1;
                    }
                    Err(err) => {
                        let input = snippet(text);
                        tracing::warn!(input = %input, error = %err, "synthesis item failed");
                        outcome.failures.push(BatchFailure {
                            input,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            Ok(())
        }
        .await;

        self.finish(token);
        result.map(|()| outcome)
    }

    /// Transcribe each audio file in order.
    pub async fn run_recognition(
        &self,
        files: Vec<AudioInput>,
        language: LanguageCode,
        version: BackendVersion,
        api_key: &str,
        token: &CancellationToken,
    ) -> AppResult<BatchOutcome> {
        self.begin(api_key, files.len(), token)?;

        let repo = self.backends.select(version);
        let mut outcome = BatchOutcome::default();
        let result: AppResult<()> = async {
            for file in &files {
                if self.observe_cancellation(token) {
                    outcome.cancelled = true;
                    break;
                }
                match repo.recognize(language, file, api_key).await {
                    Ok(record) => {
                        self.commit(ResultRecord::SpeechRecognition(record))?;
                        outcome.completed += 1;
                    }
                    Err(err) => {
                        tracing::warn!(
                            file_name = %file.file_name,
                            error = %err,
                            "recognition item failed"
                        );
                        outcome.failures.push(BatchFailure {
                            input: file.file_name.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
            Ok(())
        }
        .await;

        self.finish(token);
        result.map(|()| outcome)
    }

    /// Check preconditions and move Idle -> Running. A start while another
    /// batch is running is rejected; any stale cancellation flag is cleared.
    fn begin(&self, api_key: &str, input_count: usize, token: &CancellationToken) -> AppResult<()> {
        if api_key.trim().is_empty() {
            return Err(AppError::MissingPrecondition(
                "no API key configured; set ADDIS_API_KEY or run set-key".to_string(),
            ));
        }
        if input_count == 0 {
            return Err(AppError::MissingPrecondition(
                "nothing to submit".to_string(),
            ));
        }

        let mut state = self.state_mut()?;
        if *state != BatchState::Idle {
            return Err(AppError::BatchInProgress);
        }
        *state = BatchState::Running;
        token.reset();
        tracing::info!(input_count, "batch started");
        Ok(())
    }

    /// Poll the token at the top of an iteration; remaining inputs are simply
    /// not processed once it fires.
    fn observe_cancellation(&self, token: &CancellationToken) -> bool {
        if !token.is_cancelled() {
            return false;
        }
        if let Ok(mut state) = self.state_mut() {
            *state = BatchState::Cancelling;
        }
        tracing::info!("batch cancellation observed, stopping before next item");
        true
    }

    /// Back to Idle on loop exit, however it ended.
    fn finish(&self, token: &CancellationToken) {
        if let Ok(mut state) = self.state_mut() {
            *state = BatchState::Idle;
        }
        token.reset();
        tracing::debug!("batch finished");
    }

    fn commit(&self, record: ResultRecord) -> AppResult<()> {
        self.history
            .lock()
            .map_err(|_| AppError::Internal("history lock poisoned".to_string()))?
            .append(record)
    }

    fn state_mut(&self) -> AppResult<MutexGuard<'_, BatchState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("state lock poisoned".to_string()))
    }
}

/// Identifying prefix of a text input for failure notices.
fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
