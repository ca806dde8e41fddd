pub mod bot;
pub mod error;
pub mod healthcheck;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use ghostwriter_core::SharedState;
use tower_http::cors::{Any, CorsLayer};

pub struct RouteMeta {
    pub method: &'static str,
    pub path: &'static str,
    pub desc: &'static str,
}

pub const ROUTES: &[RouteMeta] = &[bot::META, healthcheck::META];

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(bot::META.path, get(bot::bot))
        .route(healthcheck::META.path, get(healthcheck::healthcheck))
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin, any header, the usual method set.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use ghostwriter_core::AppState;
    use ghostwriter_llm::{BackendSettings, GroundingPolicy, LlmService, LlmSettings, SystemPrompt};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{ROUTES, router};
    use crate::error::UNAVAILABLE_MESSAGE;

    const CONTEXT: &str = "bio.txt: Jeff likes hiking.\nlinks.txt: site: example.com";

    fn app(base_url: String) -> Router {
        let llm = LlmService::new(LlmSettings {
            backend: BackendSettings::OpenAi {
                api_key: "sk-test".to_owned(),
                base_url,
            },
            model: "gpt-4o-mini".to_owned(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let system_prompt = SystemPrompt::new(CONTEXT, GroundingPolicy::Strict);

        router(AppState::new(system_prompt, llm).shared())
    }

    fn dead_upstream() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    fn completion(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn bot_returns_completion_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Where does Jeff live?"))
            .and(body_string_contains("Jeff likes hiking."))
            .respond_with(completion("Honestly, I'm not sure."))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(server.uri());
        let (status, body) = get(&app, "/api/bot?message=Where%20does%20Jeff%20live%3F").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Honestly, I'm not sure." }));
    }

    #[tokio::test]
    async fn repeated_message_uses_the_first_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Where does Jeff live?"))
            .respond_with(completion("Somewhere with mountains."))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(server.uri());
        let (status, body) = get(&app, "/api/bot?message=Where%20does%20Jeff%20live%3F&message=b").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Somewhere with mountains." }));
    }

    #[tokio::test]
    async fn missing_message_uses_default_question() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Tell me about Jeff"))
            .respond_with(completion("I like hiking."))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(server.uri());
        let (status, body) = get(&app, "/api/bot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "I like hiking.");
    }

    #[tokio::test]
    async fn upstream_failure_is_isolated_to_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(completion("I build backends."))
            .mount(&server)
            .await;

        let app = app(server.uri());

        let (status, body) = get(&app, "/api/bot?message=What%20do%20you%20do%3F").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": UNAVAILABLE_MESSAGE }));

        let (status, body) = get(&app, "/api/bot?message=What%20do%20you%20do%3F").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "I build backends.");
    }

    #[tokio::test]
    async fn unreachable_upstream_maps_to_bad_gateway() {
        let app = app(dead_upstream());
        let (status, body) = get(&app, "/api/bot?message=hi").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error = body["error"].as_str().unwrap();
        assert!(!error.contains("127.0.0.1"));
        assert!(!error.to_lowercase().contains("openai"));
    }

    #[tokio::test]
    async fn healthcheck_ignores_upstream_state() {
        let app = app(dead_upstream());
        let (status, body) = get(&app, "/api/healthcheck").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = app(dead_upstream());

        let req = Request::builder()
            .uri("/api/healthcheck")
            .header(header::ORIGIN, "https://portfolio.example")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );

        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/api/bot")
            .header(header::ORIGIN, "https://portfolio.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(preflight).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let methods = resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("GET"));
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = app(dead_upstream());
        let req = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn route_registry_lists_both_endpoints() {
        let paths: Vec<_> = ROUTES.iter().map(|route| route.path).collect();
        assert_eq!(paths, ["/api/bot", "/api/healthcheck"]);
        assert!(ROUTES.iter().all(|route| route.method == "GET"));
    }
}
