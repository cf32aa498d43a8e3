use crate::helpers::{TestContext, TEST_API_KEY};

use addis_speech::domain::batch::CancellationToken;
use addis_speech::domain::history::HISTORY_KEY;
use addis_speech::domain::language::LanguageCode;
use addis_speech::domain::record::{RecordKind, ResultRecord};
use addis_speech::infrastructure::repositories::{AudioInput, BackendVersion};
use pretty_assertions::assert_eq;

/// Populate a context with one generation record and one recognition record
/// per backend version.
async fn populated() -> TestContext {
    let ctx = TestContext::new().await;
    let token = CancellationToken::new();

    ctx.batch
        .run_synthesis(
            vec!["ሰላም".to_string()],
            LanguageCode::Amharic,
            BackendVersion::V1,
            TEST_API_KEY,
            &token,
        )
        .await
        .unwrap();
    ctx.batch
        .run_recognition(
            vec![AudioInput::new("old.wav", b"RIFFa".to_vec())],
            LanguageCode::Amharic,
            BackendVersion::V1,
            TEST_API_KEY,
            &token,
        )
        .await
        .unwrap();
    ctx.batch
        .run_recognition(
            vec![AudioInput::new("new.wav", b"RIFFb".to_vec())],
            LanguageCode::Amharic,
            BackendVersion::V2,
            TEST_API_KEY,
            &token,
        )
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn it_should_filter_by_kind_without_leaking_the_other_kind() {
    let ctx = populated().await;
    let history = ctx.history();

    let generations = history.filter_by_kind(RecordKind::SpeechGeneration);
    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].display_text(), "ሰላም");

    let recognitions = history.filter_by_kind(RecordKind::SpeechRecognition);
    assert_eq!(recognitions.len(), 2);
    assert!(recognitions
        .iter()
        .all(|r| r.kind() == RecordKind::SpeechRecognition));
}

#[tokio::test]
async fn it_should_fold_the_legacy_model_label_into_v1() {
    let ctx = populated().await;
    let history = ctx.history();

    // The v1 mock reports the pre-versioning label "chat_generate"
    let v1 = history.filter_recognition_by_version("v1");
    assert_eq!(v1.len(), 1);
    match v1[0] {
        ResultRecord::SpeechRecognition(r) => {
            assert_eq!(r.source_file_name.as_deref(), Some("old.wav"))
        }
        _ => unreachable!(),
    }

    let v2 = history.filter_recognition_by_version("v2");
    assert_eq!(v2.len(), 1);
    match v2[0] {
        ResultRecord::SpeechRecognition(r) => {
            assert_eq!(r.source_file_name.as_deref(), Some("new.wav"))
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn it_should_clear_both_memory_and_persisted_state() {
    let ctx = populated().await;
    assert!(ctx.store.get(HISTORY_KEY).unwrap().is_some());

    ctx.history().clear().unwrap();

    assert!(ctx.history().is_empty());
    assert_eq!(ctx.store.get(HISTORY_KEY).unwrap(), None);
    assert!(ctx.reload_history().is_empty());
}

#[tokio::test]
async fn it_should_survive_a_corrupted_history_blob() {
    let ctx = populated().await;
    ctx.store.set(HISTORY_KEY, "{definitely not json").unwrap();

    // Malformed persisted state is silently recovered as empty, never fatal
    let reloaded = ctx.reload_history();
    assert!(reloaded.is_empty());
}
