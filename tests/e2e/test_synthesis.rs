use crate::helpers::{TestContext, TEST_API_KEY, WAV_BYTES};

use addis_speech::domain::batch::CancellationToken;
use addis_speech::domain::language::LanguageCode;
use addis_speech::domain::record::ResultRecord;
use addis_speech::error::AppError;
use addis_speech::infrastructure::repositories::BackendVersion;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn it_should_synthesize_text_and_prepend_the_record() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .batch
        .run_synthesis(
            vec!["ሰላም".to_string()],
            LanguageCode::Amharic,
            BackendVersion::V1,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed, 1);
    assert!(outcome.failures.is_empty());

    // The new record is the head of a fresh load of the full history
    let reloaded = ctx.reload_history();
    assert_eq!(reloaded.len(), 1);
    match &reloaded.records()[0] {
        ResultRecord::SpeechGeneration(r) => {
            assert_eq!(r.source_text, "ሰላም");
            assert_eq!(r.audio_data, WAV_BYTES);
        }
        other => panic!("expected a generation record, got {:?}", other.kind()),
    }
}

#[tokio::test]
async fn it_should_continue_the_batch_after_an_item_fails() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .batch
        .run_synthesis(
            vec![
                "first".to_string(),
                "boom second".to_string(),
                "third".to_string(),
            ],
            LanguageCode::AfanOromo,
            BackendVersion::V2,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].input, "boom second");
    assert!(outcome.failures[0].reason.contains("500"));

    let history = ctx.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history.records()[0].display_text(), "third");
    assert_eq!(history.records()[1].display_text(), "first");
}

#[tokio::test]
async fn it_should_round_trip_history_through_persistence() {
    let ctx = TestContext::new().await;

    ctx.batch
        .run_synthesis(
            vec!["one".to_string(), "two".to_string()],
            LanguageCode::Amharic,
            BackendVersion::V1,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let in_memory = ctx.history().records().to_vec();
    let reloaded = ctx.reload_history();
    assert_eq!(reloaded.records(), &in_memory[..]);
}

#[tokio::test]
async fn it_should_block_submission_without_an_api_key() {
    let ctx = TestContext::new().await;

    let err = ctx
        .batch
        .run_synthesis(
            vec!["hello".to_string()],
            LanguageCode::Amharic,
            BackendVersion::V1,
            "",
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MissingPrecondition(_)));
    assert!(ctx.history().is_empty());
}

#[tokio::test]
async fn it_should_report_a_rejected_key_per_item_not_fatally() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .batch
        .run_synthesis(
            vec!["hello".to_string()],
            LanguageCode::Amharic,
            BackendVersion::V1,
            "wrong-key",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed, 0);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].reason.contains("401"));
    assert!(ctx.history().is_empty());
}
