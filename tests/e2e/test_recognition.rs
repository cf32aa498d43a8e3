use crate::helpers::{TestContext, TEST_API_KEY};

use addis_speech::domain::batch::CancellationToken;
use addis_speech::domain::language::LanguageCode;
use addis_speech::domain::record::{RecognitionRecord, ResultRecord};
use addis_speech::infrastructure::repositories::{AudioInput, BackendVersion};
use pretty_assertions::assert_eq;
use serde_json::json;

fn clip(name: &str) -> AudioInput {
    AudioInput::new(name, b"RIFFuploaded-audio".to_vec())
}

async fn recognize_one(ctx: &TestContext, version: BackendVersion) -> RecognitionRecord {
    let outcome = ctx
        .batch
        .run_recognition(
            vec![clip("clip.wav")],
            LanguageCode::Amharic,
            version,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.completed, 1, "failures: {:?}", outcome.failures);

    match &ctx.history().records()[0] {
        ResultRecord::SpeechRecognition(r) => r.clone(),
        other => panic!("expected a recognition record, got {:?}", other.kind()),
    }
}

#[tokio::test]
async fn it_should_map_the_v1_response_field_for_field() {
    let ctx = TestContext::new().await;
    let record = recognize_one(&ctx, BackendVersion::V1).await;

    assert_eq!(record.raw_transcription, "```text\nheard clip.wav in am\n```");
    // Cleaned locally, never taken from the backend's transcription_clean
    assert_eq!(record.cleaned_transcription, "heard clip.wav in am");
    assert_eq!(record.finish_reason, "stop");
    assert_eq!(record.model_version, "chat_generate");
    assert_eq!(record.confidence, None);
    assert_eq!(record.usage_metadata["input_tokens"], json!(42));
    assert_eq!(record.source_file_name.as_deref(), Some("clip.wav"));
    assert_eq!(record.audio_data, b"RIFFuploaded-audio");
}

#[tokio::test]
async fn it_should_synthesize_the_missing_v2_fields() {
    let ctx = TestContext::new().await;
    let record = recognize_one(&ctx, BackendVersion::V2).await;

    // Fixed defaults, regardless of what the payload claims
    assert_eq!(record.finish_reason, "completed");
    assert_eq!(record.model_version, "v2");
    assert_eq!(record.confidence, Some(0.93));
    assert_eq!(record.cleaned_transcription, "v2 heard clip.wav in am");
    assert_eq!(record.usage_metadata["total_tokens"], json!(7));
}

#[tokio::test]
async fn it_should_name_the_failing_file_and_keep_going() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .batch
        .run_recognition(
            vec![clip("good.wav"), clip("bad.wav"), clip("fine.wav")],
            LanguageCode::AfanOromo,
            BackendVersion::V1,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].input, "bad.wav");

    let history = ctx.history();
    assert_eq!(history.len(), 2);
    // Most-recent-first, so the last successful file is at the head
    assert_eq!(
        history.records()[0].display_text(),
        "heard fine.wav in om"
    );
}

#[tokio::test]
async fn it_should_pass_the_language_code_per_version_shape() {
    let ctx = TestContext::new().await;

    // The mock echoes the language it found under the version-specific
    // metadata key, so a wrong key or shape would not produce this text
    let outcome = ctx
        .batch
        .run_recognition(
            vec![clip("a.wav")],
            LanguageCode::AfanOromo,
            BackendVersion::V2,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.completed, 1);
    assert_eq!(
        ctx.history().records()[0].display_text(),
        "v2 heard a.wav in om"
    );
}
