//! HTTP response building module
//!
//! JSON response builders for every status the router produces.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, CONTENT_LENGTH, CONTENT_TYPE,
    SERVER,
};
use hyper::{Method, Response, StatusCode};
use serde_json::{json, Value};

/// Build a JSON response with an explicit Content-Length
pub fn build_json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let bytes = match serde_json::to_vec(body) {
        Ok(b) => Bytes::from(b),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_500_response();
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, bytes.len())
        .body(Full::new(bytes))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// `{"detail": "<message>"}` response
pub fn build_detail_response(status: StatusCode, detail: &str) -> Response<Full<Bytes>> {
    build_json_response(status, &json!({ "detail": detail }))
}

pub fn build_404_response() -> Response<Full<Bytes>> {
    build_detail_response(StatusCode::NOT_FOUND, "Not Found")
}

pub fn build_400_response(detail: &str) -> Response<Full<Bytes>> {
    build_detail_response(StatusCode::BAD_REQUEST, detail)
}

/// Build 405 Method Not Allowed with the registered methods in `Allow`
pub fn build_405_response(allowed: &[Method]) -> Response<Full<Bytes>> {
    let mut response = build_detail_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    insert_allow(&mut response, allowed);
    response
}

pub fn build_413_response() -> Response<Full<Bytes>> {
    build_detail_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
}

// Static body so it cannot fail to serialize
pub fn build_500_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(
            br#"{"detail":"Internal Server Error"}"#,
        )))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allowed: &[Method], enable_cors: bool) -> Response<Full<Bytes>> {
    let mut response = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        });
    let methods = insert_allow(&mut response, allowed);

    if enable_cors {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if let Ok(value) = HeaderValue::from_str(&methods) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    }

    response
}

/// `Allow` header value: registered methods, HEAD when GET is present, then OPTIONS
pub fn allow_header(allowed: &[Method]) -> String {
    let mut methods: Vec<&str> = allowed.iter().map(Method::as_str).collect();
    if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
        methods.push(Method::HEAD.as_str());
    }
    if !allowed.contains(&Method::OPTIONS) {
        methods.push(Method::OPTIONS.as_str());
    }
    methods.join(", ")
}

/// Drop the body of a response to a HEAD request, keeping its headers
pub fn strip_body(response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Stamp the configured `Server` header
pub fn set_server_header(response: &mut Response<Full<Bytes>>, server_name: &str) {
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            response.headers_mut().insert(SERVER, value);
        }
        Err(_) => crate::logger::log_warning(&format!("Invalid server name header: {server_name:?}")),
    }
}

fn insert_allow(response: &mut Response<Full<Bytes>>, allowed: &[Method]) -> String {
    let methods = allow_header(allowed);
    if let Ok(value) = HeaderValue::from_str(&methods) {
        response.headers_mut().insert(ALLOW, value);
    }
    methods
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
