use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_app(AppState::in_memory(AppConfig::for_tests()))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(app, method, uri, token, body.map(|b| b.to_string())).await
    }

    /// Like `call`, but the body is sent verbatim.
    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b)),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, value)
    }

    async fn register(app: &Router, name: &str, email: &str, password: &str) -> StatusCode {
        let body = json!({ "name": name, "email": email, "password": password });
        call(app, Method::POST, "/api/register", None, Some(body)).await.0
    }

    async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        let body = json!({ "email": email, "password": password });
        call(app, Method::POST, "/api/login", None, Some(body)).await
    }

    #[tokio::test]
    async fn health() {
        let (status, body) = call(&app(), Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn ada_flow() {
        let app = app();
        let body = json!({ "name": "Ada", "email": "ada@x.com", "password": "secret1" });
        let (status, resp) = call(&app, Method::POST, "/api/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp, json!({ "message": "User created successfully!" }));

        let (status, resp) = login(&app, "ada@x.com", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp, json!({ "error": "Unauthorized" }));

        let (status, resp) = login(&app, "ada@x.com", "secret1").await;
        assert_eq!(status, StatusCode::OK);
        let token = resp["token"].as_str().expect("token").to_string();

        let (status, me) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["name"], "Ada");
        assert_eq!(me["email"], "ada@x.com");
        assert!(me.get("password").is_none());
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_validation_errors_are_422() {
        let app = app();
        let (status, resp) = call(
            &app,
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "email": "bad", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(resp["errors"]["name"].is_array());
        assert!(resp["errors"]["email"].is_array());
        assert!(resp["errors"]["password"].is_array());

        assert_eq!(register(&app, "Ada", "ada@x.com", "secret1").await, StatusCode::CREATED);
        let (status, resp) = call(
            &app,
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@x.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["email"][0], "The email has already been taken.");
    }

    #[tokio::test]
    async fn login_unknown_email_matches_wrong_password() {
        let app = app();
        register(&app, "Ada", "ada@x.com", "secret1").await;
        let unknown = login(&app, "ghost@x.com", "secret1").await;
        let wrong = login(&app, "ada@x.com", "nope!!").await;
        assert_eq!(unknown, wrong);

        let (status, _) = call(&app, Method::POST, "/api/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_valid_bearer() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, Method::GET, "/api/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_and_destroy() {
        let app = app();
        register(&app, "Ada", "ada@x.com", "secret1").await;
        register(&app, "Bob", "bob@x.com", "secret1").await;
        let (_, resp) = login(&app, "ada@x.com", "secret1").await;
        let token = resp["token"].as_str().unwrap().to_string();
        let (_, me) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
        let ada_id = me["id"].as_str().unwrap().to_string();

        // unauthenticated
        let uri = format!("/api/update/{ada_id}");
        let (status, _) = call(&app, Method::PUT, &uri, None, Some(json!({ "name": "X" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "email": "bob@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, resp) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "name": "Ada Lovelace", "email": "ada@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({ "message": "User updated successfully" }));

        let (_, me) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(me["name"], "Ada Lovelace");

        let missing = format!("/api/update/{}", uuid::Uuid::new_v4());
        let (status, resp) = call(&app, Method::PUT, &missing, Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(resp, json!({ "error": "User not found" }));

        let (status, _) = call(&app, Method::PUT, "/api/update/42", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let destroy = format!("/api/destroy/{ada_id}");
        let (status, resp) = call(&app, Method::DELETE, &destroy, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({ "message": "User deleted successfully" }));

        // the token still verifies but its user is gone
        let (status, _) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, Method::DELETE, &destroy, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    async fn ada_token(app: &Router) -> (String, String) {
        register(app, "Ada", "ada@x.com", "secret1").await;
        let (_, resp) = login(app, "ada@x.com", "secret1").await;
        let token = resp["token"].as_str().unwrap().to_string();
        let (_, me) = call(app, Method::GET, "/api/me", Some(&token), None).await;
        (token, me["id"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn wrong_typed_register_field_is_a_field_error() {
        let app = app();
        let body = json!({ "name": "Ada", "email": "ada@x.com", "password": 123456 });
        let (status, resp) = call(&app, Method::POST, "/api/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["password"][0], "The password field must be a string.");
        assert_eq!(resp["message"], "The password field must be a string.");
        assert!(resp["errors"].get("name").is_none());
    }

    #[tokio::test]
    async fn register_without_body_lists_required_fields() {
        let app = app();
        let (status, resp) = call(&app, Method::POST, "/api/register", None, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["name"][0], "The name field is required.");
        assert_eq!(resp["errors"]["email"][0], "The email field is required.");
        assert_eq!(resp["errors"]["password"][0], "The password field is required.");
    }

    #[tokio::test]
    async fn malformed_register_body_is_422_json() {
        let app = app();
        let (status, resp) = send(
            &app,
            Method::POST,
            "/api/register",
            None,
            Some(r#"{"name": "Ada","#.into()),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["body"][0], "The request body must be valid JSON.");

        let (status, resp) = send(&app, Method::POST, "/api/register", None, Some("[1]".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["body"][0], "The request body must be a JSON object.");
    }

    #[tokio::test]
    async fn bad_login_bodies_are_unauthorized() {
        let app = app();
        register(&app, "Ada", "ada@x.com", "secret1").await;
        let unauthorized = (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" }));

        let body = json!({ "email": "ada@x.com", "password": 123456 });
        let resp = call(&app, Method::POST, "/api/login", None, Some(body)).await;
        assert_eq!(resp, unauthorized);

        let resp = send(&app, Method::POST, "/api/login", None, Some("not json".into())).await;
        assert_eq!(resp, unauthorized);

        let resp = call(&app, Method::POST, "/api/login", None, None).await;
        assert_eq!(resp, unauthorized);
    }

    #[tokio::test]
    async fn update_without_body_changes_nothing() {
        let app = app();
        let (token, ada_id) = ada_token(&app).await;
        let uri = format!("/api/update/{ada_id}");

        let (status, resp) = call(&app, Method::PUT, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({ "message": "User updated successfully" }));

        let (_, me) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(me["name"], "Ada");
        assert_eq!(me["email"], "ada@x.com");

        let body = json!({ "name": ["Bob"] });
        let (status, resp) = call(&app, Method::PUT, &uri, Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["name"][0], "The name field must be a string.");
    }

    #[tokio::test]
    async fn blank_password_is_required_and_padding_is_trimmed() {
        let app = app();
        let body = json!({ "name": "Ada", "email": "ada@x.com", "password": "      " });
        let (status, resp) = call(&app, Method::POST, "/api/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp["errors"]["password"][0], "The password field is required.");

        assert_eq!(
            register(&app, "Ada", "ada@x.com", "  secret1  ").await,
            StatusCode::CREATED
        );
        let (status, _) = login(&app, "ada@x.com", "secret1").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = login(&app, "ada@x.com", " secret1 ").await;
        assert_eq!(status, StatusCode::OK);
    }
}
