//! HTTP surface: `GET /<url-encoded-absolute-url>`.
//!
//! One fallback handler owns the whole path space. Malformed targets get the
//! fixed sentinel body with a 200 (invalid input is the caller's mistake,
//! not a server error) and never touch the pool or the cache. Valid targets
//! go cache-first, then through the orchestrator; only valid outcomes are
//! written back to the cache.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use tracing::{debug, error, info};
use url::Url;

use crate::cache::RenderCache;
use crate::error::{PrerenderError, Result};
use crate::render::Renderer;

/// Fixed body returned for malformed render targets.
pub const INVALID_URL_SENTINEL: &str = "Invalid url";

/// Fixed body returned once retries are exhausted.
pub const RENDER_FAILED_BODY: &str = "Render failed";

/// Long-lived server state, constructed once at startup.
pub struct ServerContext {
    pub cache: Arc<RenderCache>,
    pub renderer: Arc<Renderer>,
}

pub fn router(ctx: Arc<ServerContext>) -> Router {
    Router::new().fallback(handle_render).with_state(ctx)
}

async fn handle_render(State(ctx): State<Arc<ServerContext>>, request: Request) -> Response {
    let target = match decode_target(request.uri()) {
        Ok(target) => target,
        Err(err) => {
            debug!(uri = %request.uri(), error = %err, "rejecting render target");
            return (StatusCode::OK, INVALID_URL_SENTINEL).into_response();
        }
    };

    if let Some(html) = ctx.cache.get(&target) {
        debug!(url = %target, "cache hit");
        return Html(html).into_response();
    }

    match ctx.renderer.render(&target).await {
        Ok(outcome) => {
            if outcome.valid {
                ctx.cache.set(&target, outcome.html.clone());
            } else {
                info!(url = %target, "marker element missing, outcome not cached");
            }
            Html(outcome.html).into_response()
        }
        Err(err) => {
            error!(url = %target, error = %err, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILED_BODY).into_response()
        }
    }
}

/// Decode the request path (plus query) into a render target. The decoded
/// string is used verbatim as the cache key; parsing only confirms it is an
/// absolute http(s) URL with a host.
pub fn decode_target(uri: &Uri) -> Result<String> {
    let raw = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let raw = raw.strip_prefix('/').unwrap_or(raw);
    if raw.is_empty() {
        return Err(PrerenderError::InvalidInput("empty path".to_string()));
    }

    let decoded = urlencoding::decode(raw)
        .map_err(|e| PrerenderError::InvalidInput(format!("bad percent-encoding: {}", e)))?
        .into_owned();

    let parsed = Url::parse(&decoded)
        .map_err(|e| PrerenderError::InvalidInput(format!("{}: {}", decoded, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PrerenderError::InvalidInput(format!(
            "unsupported scheme {}",
            parsed.scheme()
        )));
    }
    if !parsed.has_host() {
        return Err(PrerenderError::InvalidInput(format!(
            "missing host in {}",
            decoded
        )));
    }

    Ok(decoded)
}
