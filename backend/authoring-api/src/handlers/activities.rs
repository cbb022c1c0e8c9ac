use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extractors::{ActingUser, AppJson},
    handlers::error_response,
    models::{ActivityDraft, OpenSessionRequest, OpenSessionResponse, PendingConfirmationResponse},
    services::{activity_service::PublishOutcome, AppState},
};

pub async fn open_session(
    State(state): State<Arc<AppState>>,
    ActingUser(user_id): ActingUser,
    AppJson(req): AppJson<OpenSessionRequest>,
) -> impl IntoResponse {
    tracing::info!(
        user_id = user_id.as_str(),
        activity_id = req.activity_id.as_deref().unwrap_or("<new>"),
        "Opening authoring session"
    );

    let service = state.activity_service();
    match service
        .open_session(&user_id, req.activity_id.as_deref())
        .await
    {
        Ok((session, activity)) => (
            StatusCode::CREATED,
            Json(OpenSessionResponse {
                session_id: session.id,
                locked: session.is_locked(),
                activity,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to open authoring session: {}", e);
            error_response(e).into_response()
        }
    }
}

pub async fn validate_draft(
    State(state): State<Arc<AppState>>,
    AppJson(draft): AppJson<ActivityDraft>,
) -> impl IntoResponse {
    let report = state.activity_service().validate(&draft);
    (StatusCode::OK, Json(report))
}

pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(draft): AppJson<ActivityDraft>,
) -> impl IntoResponse {
    let service = state.activity_service();
    match service.save_draft(session_id, draft).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!("Failed to save draft: {}", e);
            error_response(e).into_response()
        }
    }
}

/// Autosave endpoint: always 204 on an open session. Storage failures are
/// swallowed here and retried by the worker.
pub async fn autosave(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(draft): AppJson<ActivityDraft>,
) -> impl IntoResponse {
    let service = state.activity_service();
    match service.autosave(session_id, draft).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(draft): AppJson<ActivityDraft>,
) -> impl IntoResponse {
    let service = state.activity_service();
    match service.publish(session_id, draft).await {
        Ok(PublishOutcome::Published(activity)) => {
            (StatusCode::OK, Json(activity)).into_response()
        }
        Ok(PublishOutcome::PendingConfirmation(warnings)) => (
            StatusCode::ACCEPTED,
            Json(PendingConfirmationResponse {
                pending_confirmation: true,
                warnings,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to publish activity: {}", e);
            error_response(e).into_response()
        }
    }
}

pub async fn confirm_publish(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(draft): AppJson<ActivityDraft>,
) -> impl IntoResponse {
    let service = state.activity_service();
    match service.confirm_publish(session_id, draft).await {
        Ok(activity) => (StatusCode::OK, Json(activity)).into_response(),
        Err(e) => {
            tracing::error!("Failed to publish activity after confirmation: {}", e);
            error_response(e).into_response()
        }
    }
}

/// Multipart upload of a draft attachment. The file lands under the
/// drafts/ prefix; the returned metadata belongs in the draft's
/// `content.attachments`.
pub async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    ActingUser(user_id): ActingUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed multipart upload: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": format!("Malformed multipart body: {}", e),
                        "status": 400
                    })),
                )
                    .into_response();
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("attachment").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read multipart field: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": format!("Failed to read uploaded file: {}", e),
                        "status": 400
                    })),
                )
                    .into_response();
            }
        };

        tracing::info!(
            user_id = user_id.as_str(),
            name = name.as_str(),
            size = bytes.len(),
            "Uploading draft attachment"
        );
        let service = state.activity_service();
        return match service
            .upload_attachment(&name, bytes.to_vec(), &mime_type)
            .await
        {
            Ok(attachment) => (StatusCode::CREATED, Json(attachment)).into_response(),
            Err(e) => {
                tracing::error!("Failed to store attachment: {}", e);
                error_response(e).into_response()
            }
        };
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": "Multipart field \"file\" is required",
            "status": 400
        })),
    )
        .into_response()
}

pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.activity_service().get(&id).await {
        Ok(activity) => (StatusCode::OK, Json(activity)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.activity_service().archive(&id).await {
        Ok(activity) => (StatusCode::OK, Json(activity)).into_response(),
        Err(e) => {
            tracing::error!("Failed to archive activity: {}", e);
            error_response(e).into_response()
        }
    }
}

pub async fn unarchive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.activity_service().unarchive(&id).await {
        Ok(activity) => (StatusCode::OK, Json(activity)).into_response(),
        Err(e) => {
            tracing::error!("Failed to unarchive activity: {}", e);
            error_response(e).into_response()
        }
    }
}

pub async fn fork(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.activity_service().fork(&id).await {
        Ok(activity) => (StatusCode::CREATED, Json(activity)).into_response(),
        Err(e) => {
            tracing::error!("Failed to fork activity: {}", e);
            error_response(e).into_response()
        }
    }
}
