//! OCC endpoint addressing and typed calls.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::context::CallContext;
use crate::error::{GatewayError, ToolError, UpstreamError};
use crate::transport::upstream::{UpstreamForwarder, UpstreamRequest};

/// Entry point the commerce tools use to reach OCC.
#[derive(Clone)]
pub struct CommerceApi {
    base: Url,
    upstream: Arc<dyn UpstreamForwarder>,
}

impl std::fmt::Debug for CommerceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceApi")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl CommerceApi {
    /// # Errors
    ///
    /// `GatewayError::Configuration` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str, upstream: Arc<dyn UpstreamForwarder>) -> Result<Self, GatewayError> {
        let base = Url::parse(base_url).map_err(|e| GatewayError::Configuration {
            details: format!("invalid commerce API base URL '{base_url}': {e}"),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(GatewayError::Configuration {
                details: format!("commerce API base URL '{base_url}' must be http(s)"),
            });
        }
        Ok(Self { base, upstream })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Base URL extended by percent-encoded path segments and query pairs.
    ///
    /// Segments are user-supplied ids (site, user, cart); encoding keeps a
    /// `/` or `?` inside one from changing the endpoint.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Perform one call and decode the body into `T`.
    ///
    /// `Ok(None)` means the API answered 2xx with an empty body.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        ctx: &CallContext,
    ) -> Result<Option<T>, ToolError> {
        let credential = ctx.credential.clone().ok_or(ToolError::MissingCredential)?;

        let mut request = UpstreamRequest::new(method, url, credential)
            .with_correlation_id(ctx.correlation_id.clone());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let value = self.upstream.call(request).await?;
        decode(value)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        ctx: &CallContext,
    ) -> Result<Option<T>, ToolError> {
        self.send(Method::GET, url, None, ctx).await
    }
}

/// `Null` → `None`; anything else must match `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<Option<T>, ToolError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(|e| {
        debug!(error = %e, "Commerce API response did not match the expected shape");
        ToolError::Upstream(UpstreamError::Decode {
            reason: e.to_string(),
        })
    })
}
