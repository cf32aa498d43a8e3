use crate::helpers::{TestContext, TEST_API_KEY};

use addis_speech::domain::batch::{BatchState, CancellationToken};
use addis_speech::domain::language::LanguageCode;
use addis_speech::infrastructure::repositories::{AudioInput, BackendVersion};
use pretty_assertions::assert_eq;

fn clips(names: &[&str]) -> Vec<AudioInput> {
    names
        .iter()
        .map(|n| AudioInput::new(*n, b"RIFFaudio".to_vec()))
        .collect()
}

#[tokio::test]
async fn it_should_stop_at_the_item_boundary_when_cancelled_in_flight() {
    let ctx = TestContext::new().await;
    let token = CancellationToken::new();

    // The backend cancels the token while serving request 2, i.e. while that
    // item is still in flight
    ctx.backend.cancel_during(2, token.clone());

    let outcome = ctx
        .batch
        .run_recognition(
            clips(&["1.wav", "2.wav", "3.wav", "4.wav", "5.wav"]),
            LanguageCode::Amharic,
            BackendVersion::V1,
            TEST_API_KEY,
            &token,
        )
        .await
        .unwrap();

    // Item 2 completes normally; items 3-5 are never dispatched
    assert!(outcome.cancelled);
    assert_eq!(outcome.completed, 2);
    assert!(outcome.failures.is_empty());
    assert_eq!(ctx.backend.recognize_calls(), 2);
    assert_eq!(ctx.history().len(), 2);

    // The loop is back to Idle and the flag is cleared
    assert_eq!(ctx.batch.state(), BatchState::Idle);
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn it_should_process_a_full_batch_in_submission_order() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .batch
        .run_recognition(
            clips(&["a.wav", "b.wav", "c.wav"]),
            LanguageCode::Amharic,
            BackendVersion::V2,
            TEST_API_KEY,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed, 3);
    assert_eq!(ctx.backend.recognize_calls(), 3);

    // Prepend-on-completion of a sequential loop: reverse submission order
    let history = ctx.history();
    let texts: Vec<&str> = history.records().iter().map(|r| r.display_text()).collect();
    assert_eq!(
        texts,
        vec![
            "v2 heard c.wav in am",
            "v2 heard b.wav in am",
            "v2 heard a.wav in am",
        ]
    );
}
