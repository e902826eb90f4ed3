//! Axum router configuration with middleware.
//!
//! All bot routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/bots",
            get(handlers::bot::list_bots).post(handlers::bot::create_bot),
        )
        .route(
            "/bots/{id}",
            get(handlers::bot::get_bot)
                .put(handlers::bot::update_bot)
                .delete(handlers::bot::delete_bot),
        )
        .route("/bots/{id}/edit", get(handlers::bot::edit_form))
        .route("/bots/{id}/map.html", get(handlers::bot::export_map));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple liveness endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn status_of(router: Router, method: &str, uri: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let router = build_router(test_state().await);
        assert_eq!(status_of(router, "GET", "/health", "").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn routes_map_errors_to_status_codes() {
        let router = build_router(test_state().await);

        let missing = format!("/api/v1/bots/{}", uuid::Uuid::now_v7());
        assert_eq!(
            status_of(router.clone(), "GET", &missing, "").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(router.clone(), "GET", "/api/v1/bots/garbage/map.html", "").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                router.clone(),
                "POST",
                "/api/v1/bots",
                r#"{"name": "Helper", "messages_tree": "[]"}"#,
            )
            .await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                router,
                "POST",
                "/api/v1/bots",
                r#"{"name": "Helper", "messages_tree": [{"content": "Hi"}]}"#,
            )
            .await,
            StatusCode::CREATED
        );
    }
}
