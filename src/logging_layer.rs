//! Access logging for the HTTP surface.
//!
//! Built on `tower_http::trace::TraceLayer`. Each request gets a span
//! carrying a request id and, when the client sent one, the MCP session id.
//! Header dumps only happen at DEBUG and credential-bearing headers are
//! redacted.

use std::fmt;
use std::time::Duration;

use http::{HeaderMap, Request, Response};
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::{DefaultOnBodyChunk, DefaultOnEos, MakeSpan, OnFailure, OnRequest, OnResponse, TraceLayer};
use tracing::{Span, debug, info, warn};

use crate::transport::jsonrpc::fast_correlation_id;
use crate::transport::server::SESSION_HEADER;

/// Never logged verbatim. Matched case-insensitively.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "proxy-authorization",
    "x-api-key",
    "x-auth-token",
];

const MAX_HEADERS_TO_LOG: usize = 50;
const MAX_VALUE_LEN: usize = 1024;

pub type AccessLogLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    CorrelationMakeSpan,
    OnRequestLogger,
    OnResponseLogger,
    DefaultOnBodyChunk,
    DefaultOnEos,
    OnFailureLogger,
>;

pub fn logging_layer() -> AccessLogLayer {
    TraceLayer::new_for_http()
        .make_span_with(CorrelationMakeSpan)
        .on_request(OnRequestLogger)
        .on_response(OnResponseLogger)
        .on_failure(OnFailureLogger)
}

/// Span with `request_id` (from `x-request-id` or generated) and the
/// client's `mcp-session-id`, if any.
#[derive(Clone, Debug)]
pub struct CorrelationMakeSpan;

impl<B> MakeSpan<B> for CorrelationMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = header_str(request.headers(), "x-request-id")
            .map(str::to_owned)
            .unwrap_or_else(|| fast_correlation_id().to_string());
        let session_id = header_str(request.headers(), SESSION_HEADER).unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            session_id = %session_id,
        )
    }
}

#[derive(Clone, Debug)]
pub struct OnRequestLogger;

impl<B> OnRequest<B> for OnRequestLogger {
    fn on_request(&mut self, request: &Request<B>, _span: &Span) {
        info!(
            method = %request.method(),
            uri = %request.uri(),
            direction = "inbound",
            "Request received"
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                version = ?request.version(),
                headers = ?SanitizedHeaders(request.headers()),
                "Request details"
            );
        }
    }
}

#[derive(Clone, Debug)]
pub struct OnResponseLogger;

impl<B> OnResponse<B> for OnResponseLogger {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        info!(
            status = response.status().as_u16(),
            latency_ms = latency.as_millis(),
            direction = "outbound",
            "Response sent"
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(headers = ?SanitizedHeaders(response.headers()), "Response details");
        }
    }
}

#[derive(Clone, Debug)]
pub struct OnFailureLogger;

impl OnFailure<ServerErrorsFailureClass> for OnFailureLogger {
    fn on_failure(&mut self, failure: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
        warn!(
            classification = %failure,
            latency_ms = latency.as_millis(),
            "Request failed"
        );
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Debug view of a header map with secrets redacted and long values cut.
pub struct SanitizedHeaders<'a>(pub &'a HeaderMap);

impl fmt::Debug for SanitizedHeaders<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();

        for (idx, (name, value)) in self.0.iter().enumerate() {
            if idx >= MAX_HEADERS_TO_LOG {
                map.entry(&"...", &format!("({} more headers)", self.0.len() - idx));
                break;
            }

            let name = name.as_str();
            if is_sensitive(name) {
                map.entry(&name, &"[REDACTED]");
                continue;
            }

            match value.to_str() {
                Ok(text) if text.len() <= MAX_VALUE_LEN => {
                    map.entry(&name, &text);
                }
                Ok(text) => {
                    map.entry(
                        &name,
                        &format!("{}... ({} bytes)", truncate(text, MAX_VALUE_LEN), text.len()),
                    );
                }
                Err(_) => {
                    map.entry(&name, &format!("<binary: {} bytes>", value.len()));
                }
            }
        }

        map.finish()
    }
}

fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

fn truncate(text: &str, max: usize) -> &str {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_sensitive_headers_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer secret-token"));
        headers.insert("cookie", HeaderValue::from_static("sid=abc"));
        headers.insert(SESSION_HEADER, HeaderValue::from_static("3f2a"));

        let rendered = format!("{:?}", SanitizedHeaders(&headers));
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("sid=abc"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("3f2a"));
    }

    #[test]
    fn test_long_values_truncated() {
        let mut headers = HeaderMap::new();
        let long = "é".repeat(MAX_VALUE_LEN);
        headers.insert("x-trace", HeaderValue::from_str(&long).unwrap());

        let rendered = format!("{:?}", SanitizedHeaders(&headers));
        assert!(rendered.contains(&format!("({} bytes)", long.len())));
    }

    #[test]
    fn test_header_count_capped() {
        let mut headers = HeaderMap::new();
        for i in 0..(MAX_HEADERS_TO_LOG + 5) {
            headers.insert(
                http::header::HeaderName::from_bytes(format!("x-h{i}").as_bytes()).unwrap(),
                HeaderValue::from_static("v"),
            );
        }

        let rendered = format!("{:?}", SanitizedHeaders(&headers));
        assert!(rendered.contains("(5 more headers)"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
