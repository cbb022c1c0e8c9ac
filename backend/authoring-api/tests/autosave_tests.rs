mod common;

use authoring_api::models::activity::ActivityStatus;

use common::{flaky_app, quiz_draft};

#[tokio::test]
async fn autosave_swallows_storage_failures() {
    let (state, store) = flaky_app();
    let service = state.activity_service();

    let (session, _) = service.open_session("teacher-1", None).await.unwrap();

    store.set_failing(true);
    // No error surfaces; the draft is staged for the retry worker.
    service
        .autosave(session.id, quiz_draft())
        .await
        .expect("autosave never surfaces storage failures");

    let staged = state.sessions.get(session.id).await.unwrap();
    assert!(staged.pending_autosave.is_some());
    assert!(staged.activity_id.is_none());
}

#[tokio::test]
async fn staged_draft_is_flushed_on_the_next_tick() {
    let (state, store) = flaky_app();
    let service = state.activity_service();

    let (session, _) = service.open_session("teacher-1", None).await.unwrap();

    store.set_failing(true);
    service.autosave(session.id, quiz_draft()).await.unwrap();

    // While the outage lasts, the retry keeps the draft staged.
    assert_eq!(service.flush_pending_autosaves().await, 0);
    let still_staged = state.sessions.get(session.id).await.unwrap();
    assert!(still_staged.pending_autosave.is_some());

    // Storage heals; the next tick flushes the draft.
    store.set_failing(false);
    assert_eq!(service.flush_pending_autosaves().await, 1);

    let session_after = state.sessions.get(session.id).await.unwrap();
    assert!(session_after.pending_autosave.is_none());
    let activity_id = session_after.activity_id.expect("flush created the row");

    let activity = service.get(&activity_id).await.unwrap();
    assert_eq!(activity.status, ActivityStatus::Draft);
    assert_eq!(activity.title, "Quiz 1");
}

#[tokio::test]
async fn successful_autosave_clears_the_staged_draft() {
    let (state, _) = flaky_app();
    let service = state.activity_service();

    let (session, _) = service.open_session("teacher-1", None).await.unwrap();
    service.autosave(session.id, quiz_draft()).await.unwrap();

    let after = state.sessions.get(session.id).await.unwrap();
    assert!(after.pending_autosave.is_none());
    assert!(after.activity_id.is_some());
}

#[tokio::test]
async fn autosave_retry_reattempts_only_the_latest_draft() {
    let (state, store) = flaky_app();
    let service = state.activity_service();

    let (session, _) = service.open_session("teacher-1", None).await.unwrap();

    store.set_failing(true);
    service.autosave(session.id, quiz_draft()).await.unwrap();

    let mut newer = quiz_draft();
    newer.title = "Quiz 1 (latest)".to_string();
    service.autosave(session.id, newer).await.unwrap();

    store.set_failing(false);
    assert_eq!(service.flush_pending_autosaves().await, 1);

    let session_after = state.sessions.get(session.id).await.unwrap();
    let activity = service
        .get(&session_after.activity_id.unwrap())
        .await
        .unwrap();
    assert_eq!(activity.title, "Quiz 1 (latest)");
}
