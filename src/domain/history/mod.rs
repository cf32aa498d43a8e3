use crate::domain::record::{RecordKind, ResultRecord};
use crate::error::{AppError, AppResult};
use crate::infrastructure::storage::KeyValueStore;
use std::sync::Arc;

/// Key under which the serialized record list is persisted
pub const HISTORY_KEY: &str = "history";

/// Model label the chat endpoint reported before explicit version tracking;
/// treated as "v1" when filtering recognition records.
pub const LEGACY_V1_LABEL: &str = "chat_generate";

/// Ordered list of result records, most-recent-first, mirrored to a
/// [`KeyValueStore`] after every mutation.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    records: Vec<ResultRecord>,
}

impl HistoryStore {
    /// Load the persisted history. An absent or malformed blob silently
    /// yields an empty history; malformed state is never fatal.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let records = match Self::read_persisted(store.as_ref()) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "persisted history unreadable, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(record_count = records.len(), "history loaded");
        Self { store, records }
    }

    fn read_persisted(store: &dyn KeyValueStore) -> AppResult<Vec<ResultRecord>> {
        let Some(raw) = store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| AppError::MalformedPersistedState(e.to_string()))
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert at the head and persist the full updated list.
    pub fn append(&mut self, record: ResultRecord) -> AppResult<()> {
        self.records.insert(0, record);
        self.persist()
    }

    /// Empty the list and drop the persisted blob.
    pub fn clear(&mut self) -> AppResult<()> {
        self.records.clear();
        self.store.remove(HISTORY_KEY)
    }

    pub fn filter_by_kind(&self, kind: RecordKind) -> Vec<&ResultRecord> {
        self.records.iter().filter(|r| r.kind() == kind).collect()
    }

    /// Recognition records whose model version matches `version`. The legacy
    /// chat label counts as "v1".
    pub fn filter_recognition_by_version(&self, version: &str) -> Vec<&ResultRecord> {
        let accept_legacy = version == "v1";
        self.records
            .iter()
            .filter(|r| match r {
                ResultRecord::SpeechRecognition(rec) => {
                    rec.model_version == version
                        || (accept_legacy && rec.model_version == LEGACY_V1_LABEL)
                }
                ResultRecord::SpeechGeneration(_) => false,
            })
            .collect()
    }

    fn persist(&self) -> AppResult<()> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| AppError::Internal(format!("cannot serialize history: {}", e)))?;
        self.store.set(HISTORY_KEY, &json)
    }
}
