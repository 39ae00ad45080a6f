use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{any, get};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors_and_log;
use crate::state::SharedState;

/// Build the application router.
///
/// Trailing-slash normalisation has to wrap the finished router, see
/// [`crate::server::GatewayServer::run_until`].
pub fn build_router(state: SharedState) -> Router {
    let timeout = Duration::from_secs(state.config.gateway.request_timeout_secs);

    // Specific routes first; `/` and the static fallback catch the rest.
    Router::new()
        .route("/helloworld", get(handlers::hello_world))
        .route("/hellovars/{var1}/{var2}", get(handlers::hello_vars))
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/greetings", get(handlers::greetings))
        .route("/", any(handlers::home_page))
        .fallback(handlers::static_file)
        .layer(from_fn(cors_and_log))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use helloworld_config::AppConfig;
    use helloworld_db::{Database, Migrator};
    use tower::ServiceExt;

    use super::*;
    use crate::state::AppState;

    fn test_state() -> SharedState {
        let db = Arc::new(Database::in_memory().unwrap());
        let report = db.migrate(&Migrator::embedded()).unwrap();
        Arc::new(AppState::new(AppConfig::default(), db, report))
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn hello_vars_echoes_path_params() {
        let resp = build_router(test_state())
            .oneshot(Request::get("/hellovars/a/b").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Path params: a b\n");
    }

    #[tokio::test]
    async fn every_response_carries_cors_headers() {
        let resp = build_router(test_state())
            .oneshot(Request::get("/ui/missing.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-allow-methods"],
            "POST, GET, OPTIONS, PUT, DELETE"
        );
    }

    #[tokio::test]
    async fn root_serves_index_for_any_method() {
        let resp = build_router(test_state())
            .oneshot(Request::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("<h1>helloworldapp</h1>"));
    }

    #[tokio::test]
    async fn hello_world_rejects_post() {
        let resp = build_router(test_state())
            .oneshot(Request::post("/helloworld").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn greetings_come_from_migrated_table() {
        let resp = build_router(test_state())
            .oneshot(Request::get("/api/greetings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json[0]["message"], "Hello World");
    }

    #[tokio::test]
    async fn greetings_on_unmigrated_database_is_server_error() {
        let db = Arc::new(Database::in_memory().unwrap());
        let report = helloworld_db::MigrationReport {
            starting_version: helloworld_db::SchemaVersion::UNINITIALIZED,
            final_version: helloworld_db::SchemaVersion::UNINITIALIZED,
            applied: Vec::new(),
            failure: Some("skipped".into()),
        };
        let state = Arc::new(AppState::new(AppConfig::default(), db, report));

        let resp = build_router(state)
            .oneshot(Request::get("/api/greetings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(resp).await.contains("no such table"));
    }
}
