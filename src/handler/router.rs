//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body size checks, body collection,
//! OPTIONS/HEAD handling, router dispatch and access logging.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::http::uri::PathAndQuery;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{Dispatch, HandlerError, RequestParts};

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let access_log = state.cached_access_log.load(Ordering::Relaxed);

    logger::log_request(req.method(), req.uri(), req.version());
    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let mut entry = access_log.then(|| access_entry(&req, peer_addr));

    let max_body_size = state.config.http.max_body_size;
    let mut response = if let Some(resp) = check_body_size(&req, max_body_size) {
        resp
    } else {
        match read_parts(req, max_body_size).await {
            Ok(parts) => respond(&state, &parts),
            Err(resp) => resp,
        }
    };
    http::set_server_header(&mut response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Answer decoupled request parts; no I/O
pub fn respond(state: &AppState, parts: &RequestParts) -> Response<Full<Bytes>> {
    let router = &state.router;

    if parts.method == Method::OPTIONS {
        let allowed = router.allowed_methods(&parts.path);
        if allowed.is_empty() {
            return http::build_404_response();
        }
        return http::build_options_response(&allowed, state.config.http.enable_cors);
    }

    if parts.method == Method::HEAD {
        let mut as_get = parts.clone();
        as_get.method = Method::GET;
        return http::strip_body(dispatch_response(router.dispatch(&as_get), &as_get));
    }

    dispatch_response(router.dispatch(parts), parts)
}

fn dispatch_response(outcome: Dispatch, parts: &RequestParts) -> Response<Full<Bytes>> {
    let status = outcome.status();
    match outcome {
        Dispatch::Handled(value) => http::build_json_response(status, &value),
        Dispatch::NotFound => http::build_404_response(),
        Dispatch::MethodNotAllowed(allowed) => http::build_405_response(&allowed),
        Dispatch::Invalid(errors) | Dispatch::Failed(HandlerError::Invalid(errors)) => {
            logger::log_validation_failure(&parts.method, &parts.path, &errors);
            http::build_json_response(status, &errors.to_body())
        }
        Dispatch::Failed(HandlerError::NotFound(detail)) => {
            http::build_detail_response(status, &detail)
        }
        Dispatch::Failed(HandlerError::Internal(message)) => {
            logger::log_error(&format!("{} {}: {message}", parts.method, parts.path));
            http::build_500_response()
        }
    }
}

/// Collect the body within the size limit
///
/// Chunked bodies carry no Content-Length, so the limit is enforced here too.
async fn read_parts<B>(
    req: Request<B>,
    max_body_size: u64,
) -> Result<RequestParts, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (head, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);

    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!(
                "Request body exceeded {max_body_size} bytes: {} {}",
                head.method, head.uri
            ));
            return Err(http::build_413_response());
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(http::build_400_response("Failed to read request body"));
        }
    };

    let target = head.uri.path_and_query().map_or("/", PathAndQuery::as_str);
    Ok(RequestParts::new(head.method, target).with_body(body))
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = req.headers().get(CONTENT_LENGTH)?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        _ => None,
    }
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}
