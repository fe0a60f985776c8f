//! Forwarding of passed-through requests to the page renderer.

use crate::fingate::{handlers::Message, APP_USER_AGENT};
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Extension, Request},
    http::{
        header::{CONNECTION, CONTENT_LENGTH, HOST},
        request::Parts,
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::{debug, error, instrument};
use url::Url;

/// Largest request body buffered before forwarding.
pub const MAX_BODY_BYTES: usize = 10 << 20;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// The page renderer sitting behind the gate.
#[derive(Debug, Clone)]
pub struct Upstream {
    base: Url,
    client: reqwest::Client,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the URL is not http(s) or the HTTP client cannot be built.
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            anyhow::bail!("Upstream URL must be http(s) with a host: {base}");
        }

        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { base, client })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Map a request path onto the upstream, keeping any base path prefix.
    #[must_use]
    pub fn url_for(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{path}"));
        url.set_query(query);
        url
    }

    /// Whether the upstream answers at all; any HTTP status counts.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> bool {
        match self.client.get(self.base.clone()).send().await {
            Ok(_) => true,
            Err(e) => {
                error!("Upstream probe failed: {e}");
                false
            }
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers listed in `Connection` are hop-by-hop too.
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Tell the renderer what the client asked for, since it only sees the gate.
fn set_forwarded(headers: &mut HeaderMap, parts: &Parts) {
    let host = parts
        .headers
        .get(HOST)
        .cloned()
        .or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
        });
    if let Some(host) = host {
        headers.insert(X_FORWARDED_HOST, host);
    }

    // An outer proxy terminating TLS already said which scheme the client used.
    if !headers.contains_key(X_FORWARDED_PROTO) {
        let proto = parts.uri.scheme_str().unwrap_or("http");
        if let Ok(proto) = HeaderValue::from_str(proto) {
            headers.insert(X_FORWARDED_PROTO, proto);
        }
    }

    if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        let forwarded_for = match headers
            .get(X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(chain) => format!("{chain}, {}", peer.ip()),
            None => peer.ip().to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}

fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(Message::new("upstream unavailable")),
    )
        .into_response()
}

/// Forward the request unchanged and relay the upstream answer.
pub async fn forward(Extension(upstream): Extension<Arc<Upstream>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            debug!("Failed to buffer request body: {e}");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(Message::new("request body too large")),
            )
                .into_response();
        }
    };

    let url = upstream.url_for(parts.uri.path(), parts.uri.query());
    let mut headers = parts.headers.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(HOST);
    headers.remove(CONTENT_LENGTH);
    set_forwarded(&mut headers, &parts);

    debug!("forwarding {} {}", parts.method, url);

    let response = match upstream
        .client
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Upstream request failed: {e}");
            return bad_gateway();
        }
    };

    let status = response.status();
    let mut headers = response.headers().clone();
    strip_hop_by_hop(&mut headers);

    (status, headers, Body::from_stream(response.bytes_stream())).into_response()
}
