//! End-to-end behaviour of the gate in front of a stand-in page renderer.
//!
//! The renderer echoes method, path, query and session cookie so pass-through
//! requests can be told apart from redirects.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{
        header::{COOKIE, HOST, LOCATION, SET_COOKIE},
        HeaderMap, Request, StatusCode,
    },
    response::Response,
    routing::get,
    Router,
};
use fingate::{
    fingate::{proxy::Upstream, router},
    gate::{
        routes::parse_patterns, Gate, RedirectTargets, RouteClassifier, SessionClaims,
        SessionCookie, SessionVerifier,
    },
};
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use secrecy::SecretString;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

const SECRET: &str = "integration-secret";
const LARGE_PAGE_BYTES: usize = 12 << 20;

async fn renderer(request: axum::extract::Request) -> String {
    let cookie = request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    format!(
        "{} {} {} {}",
        request.method(),
        request.uri().path(),
        request.uri().query().unwrap_or("-"),
        cookie
    )
}

async fn forwarded_headers(headers: HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "{} {} {}",
        header("x-forwarded-host"),
        header("x-forwarded-proto"),
        header("x-forwarded-for")
    )
}

async fn spawn_renderer() -> Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/echo-headers", get(forwarded_headers))
        .route("/large", get(|| async { vec![b'x'; LARGE_PAGE_BYTES] }))
        .fallback(renderer);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    Ok(Url::parse(&format!("http://{addr}"))?)
}

fn gate() -> Result<Arc<Gate>> {
    let verifier = SessionVerifier::new(&SecretString::from(SECRET.to_string()))?;
    let classifier = RouteClassifier::new(
        parse_patterns("/login")?,
        parse_patterns("/profile/*,/subscriptions/*")?,
    )?;
    Ok(Arc::new(Gate::new(
        verifier,
        classifier,
        RedirectTargets::new("/login", "/profile")?,
        SessionCookie::new("access_token", true)?,
    )))
}

async fn app() -> Result<Router> {
    let upstream = Upstream::new(spawn_renderer().await?, Duration::from_secs(5))?;
    Ok(router(gate()?, Arc::new(upstream)))
}

fn token(secret: &str, sub: &str, ttl: i64) -> Result<String> {
    let claims = SessionClaims {
        sub: Some(sub.into()),
        exp: get_current_timestamp().saturating_add_signed(ttl),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>) -> Result<Response> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, format!("access_token={cookie}"));
    }
    Ok(app.clone().oneshot(builder.body(Body::empty())?).await?)
}

async fn body_string(response: Response) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn location(response: &Response) -> Option<&str> {
    response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn login_without_cookie_passes_through() -> Result<()> {
    let app = app().await?;

    let response = send(&app, "GET", "/login", None).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, "GET /login - -");
    Ok(())
}

#[tokio::test]
async fn login_with_valid_token_redirects_to_profile() -> Result<()> {
    let app = app().await?;
    let token = token(SECRET, "1", 600)?;

    let response = send(&app, "GET", "/login", Some(&token)).await?;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/profile"));
    Ok(())
}

#[tokio::test]
async fn profile_without_cookie_redirects_to_login() -> Result<()> {
    let app = app().await?;

    let response = send(&app, "GET", "/profile", None).await?;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn profile_with_valid_token_passes_through() -> Result<()> {
    let app = app().await?;
    let token = token(SECRET, "1", 600)?;

    let response = send(&app, "GET", "/profile?tab=avatar", Some(&token)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await?,
        format!("GET /profile tab=avatar access_token={token}")
    );
    Ok(())
}

#[tokio::test]
async fn subscription_with_expired_token_redirects_to_login() -> Result<()> {
    let app = app().await?;
    let token = token(SECRET, "1", -60)?;

    let response = send(&app, "GET", "/subscriptions/42", Some(&token)).await?;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn token_signed_with_other_secret_is_logged_out() -> Result<()> {
    let app = app().await?;
    let forged = token("not-the-secret", "1", 600)?;

    let response = send(&app, "GET", "/subscriptions", Some(&forged)).await?;
    assert_eq!(location(&response), Some("/login"));

    let response = send(&app, "GET", "/login", Some(&forged)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn neutral_paths_ignore_credentials() -> Result<()> {
    let app = app().await?;
    let valid = token(SECRET, "1", 600)?;
    let expired = token(SECRET, "1", -60)?;

    for cookie in [None, Some(valid.as_str()), Some(expired.as_str()), Some("junk")] {
        for path in ["/", "/register", "/profiles", "/subscriptionsx"] {
            let response = send(&app, "GET", path, cookie).await?;
            assert_eq!(response.status(), StatusCode::OK, "{path} {cookie:?}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn forwards_method_and_body() -> Result<()> {
    let app = app().await?;

    let request = Request::builder()
        .method("POST")
        .uri("/register?step=2")
        .body(Body::from("email=a@b.c"))?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, "POST /register step=2 -");
    Ok(())
}

#[tokio::test]
async fn forwards_client_host_and_address() -> Result<()> {
    let app = app().await?;
    let peer: SocketAddr = "203.0.113.7:50000".parse()?;

    let request = Request::builder()
        .uri("/echo-headers")
        .header(HOST, "finance.example.com")
        .header("x-forwarded-for", "198.51.100.1")
        .extension(ConnectInfo(peer))
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await?,
        "finance.example.com http 198.51.100.1, 203.0.113.7"
    );

    let request = Request::builder()
        .uri("/echo-headers")
        .header(HOST, "finance.example.com")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;
    assert_eq!(body_string(response).await?, "finance.example.com https -");
    Ok(())
}

#[tokio::test]
async fn relays_pages_larger_than_request_limit() -> Result<()> {
    let app = app().await?;

    let response = send(&app, "GET", "/large", None).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(bytes.len(), LARGE_PAGE_BYTES);
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() -> Result<()> {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let upstream = Upstream::new(
        Url::parse(&format!("http://{addr}"))?,
        Duration::from_secs(2),
    )?;
    let app = router(gate()?, Arc::new(upstream));

    let response = send(&app, "GET", "/", None).await?;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = send(&app, "GET", "/health", None).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn health_reports_upstream() -> Result<()> {
    let app = app().await?;

    let response = send(&app, "GET", "/health", None).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-app"));
    assert!(response.headers().contains_key("x-request-id"));
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["upstream"], "ok");
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookie() -> Result<()> {
    let app = app().await?;
    let token = token(SECRET, "1", 600)?;

    let response = send(&app, "POST", "/logout", Some(&token)).await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok()),
        Some("access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    );
    Ok(())
}

#[tokio::test]
async fn session_resolves_identity() -> Result<()> {
    let app = app().await?;
    let token = token(SECRET, "42", 600)?;

    let response = send(&app, "GET", "/session", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["user_id"], 42);

    let request = Request::builder()
        .uri("/session")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/session", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["message"], "missing credentials");
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = app().await?;

    let response = send(&app, "GET", "/api-docs/openapi.json", None).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert!(json["paths"]["/session"].is_object());
    Ok(())
}
