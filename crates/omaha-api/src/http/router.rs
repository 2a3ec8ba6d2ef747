//! Axum router configuration with middleware.
//!
//! Middleware: CORS (any origin, matching browser clients served from
//! elsewhere) and request tracing. The CORS layer answers preflight
//! `OPTIONS` requests itself, so those never reach the 405 fallback.

use axum::Router;
use axum::routing::post;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the relay router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/ask",
            post(handlers::ask::ask).fallback(handlers::ask::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use reqwest::{Method, StatusCode, header};
    use tokio::net::TcpListener;

    use omaha_core::llm::provider::LlmProvider;
    use omaha_core::llm::scripted::ScriptedProvider;
    use omaha_types::config::ServerConfig;

    use super::*;

    /// Serve the router on an ephemeral port.
    async fn spawn_server(provider: Arc<ScriptedProvider>) -> SocketAddr {
        let dyn_provider: Arc<dyn LlmProvider> = provider;
        let state = AppState::new(ServerConfig::default(), Some(dyn_provider));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        addr
    }

    fn ask_url(addr: SocketAddr) -> String {
        format!("http://{addr}/ask")
    }

    #[tokio::test]
    async fn test_non_post_methods_are_405_with_json_body() {
        let provider = Arc::new(ScriptedProvider::deltas(["unused"]));
        let addr = spawn_server(provider.clone()).await;
        let client = reqwest::Client::new();

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let response = client
                .request(method.clone(), ask_url(addr))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json",
                "{method}"
            );
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "Method not allowed", "{method}");
        }

        let response = client.head(ask_url(addr)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_bodies_are_400() {
        let provider = Arc::new(ScriptedProvider::deltas(["unused"]));
        let addr = spawn_server(provider.clone()).await;
        let client = reqwest::Client::new();

        let json_bodies = ["{not json", r#"{"question": 5}"#, "[]", ""];
        for raw in json_bodies {
            let response = client
                .post(ask_url(addr))
                .header(header::CONTENT_TYPE, "application/json")
                .body(raw)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{raw:?}");
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "Question is required", "{raw:?}");
        }

        let response = client
            .post(ask_url(addr))
            .body(r#"{"question":"no content type"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_post_streams_wire_events() {
        let provider = Arc::new(ScriptedProvider::deltas(["Buy ", "wonderful businesses."]));
        let addr = spawn_server(provider.clone()).await;

        let response = reqwest::Client::new()
            .post(ask_url(addr))
            .json(&serde_json::json!({
                "question": "What should I own?",
                "conversationHistory": [],
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(
            response.text().await.unwrap(),
            "data: {\"content\":\"Buy \"}\n\n\
             data: {\"content\":\"wonderful businesses.\"}\n\n\
             data: {\"done\":true}\n\n"
        );
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered() {
        let provider = Arc::new(ScriptedProvider::deltas(["unused"]));
        let addr = spawn_server(provider).await;

        let response = reqwest::Client::new()
            .request(Method::OPTIONS, ask_url(addr))
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
