use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-user-id"),
        ])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1/activities", activities_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(csp_middleware))
        .layer(TraceLayer::new_for_http())
}

fn activities_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/sessions", post(handlers::activities::open_session))
        .route("/validate", post(handlers::activities::validate_draft))
        .route(
            "/attachments",
            post(handlers::activities::upload_attachment),
        )
        .route(
            "/sessions/{id}/draft",
            put(handlers::activities::save_draft),
        )
        .route(
            "/sessions/{id}/autosave",
            post(handlers::activities::autosave),
        )
        .route(
            "/sessions/{id}/publish",
            post(handlers::activities::publish),
        )
        .route(
            "/sessions/{id}/publish/confirm",
            post(handlers::activities::confirm_publish),
        )
        .route("/{id}", get(handlers::activities::get_activity))
        .route("/{id}/archive", post(handlers::activities::archive))
        .route("/{id}/unarchive", post(handlers::activities::unarchive))
        .route("/{id}/fork", post(handlers::activities::fork))
}
