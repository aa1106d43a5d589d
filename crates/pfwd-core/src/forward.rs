//! Outbound forwarding of the captured parameter.
//!
//! Uses the curl crate (libcurl) for a single-shot form POST with a bearer
//! `Authorization` header, and decodes the response body as JSON on a
//! best-effort basis.

use serde_json::Value;
use std::time::Duration;

/// Error returned by a forwarding attempt. The page flow swallows both kinds.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Target URL is blank; nothing was sent.
    #[error("request URL is empty")]
    InvalidUrl,
    /// Curl reported an error (DNS, connection, timeout, etc.).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
}

/// Everything needed for one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub url: String,
    pub bearer_token: String,
    pub param_name: String,
    pub value: String,
}

impl ForwardRequest {
    /// Exact `Authorization` header value sent.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.bearer_token)
    }

    /// Form-urlencoded body with exactly one field.
    pub fn body(&self) -> String {
        encode_form_body(&self.param_name, &self.value)
    }
}

/// Performs the outbound call. `Ok(None)` means "no usable body".
pub trait Forward: Send + Sync {
    fn forward(&self, req: &ForwardRequest) -> Result<Option<Value>, ForwardError>;
}

/// Production forwarder: one fresh curl handle per call, no retry.
#[derive(Debug, Clone, Default)]
pub struct CurlForwarder {
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl CurlForwarder {
    pub fn new(connect_timeout: Option<Duration>, timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    fn perform(&self, req: &ForwardRequest) -> Result<Vec<u8>, curl::Error> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(&req.url)?;
        easy.post(true)?;
        easy.post_fields_copy(req.body().as_bytes())?;
        if let Some(t) = self.connect_timeout {
            easy.connect_timeout(t)?;
        }
        if let Some(t) = self.timeout {
            easy.timeout(t)?;
        }

        let mut list = curl::easy::List::new();
        list.append(&format!("Authorization: {}", req.authorization()))?;
        list.append("Content-Type: application/x-www-form-urlencoded")?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        tracing::trace!(code, bytes = body.len(), "forward response received");
        Ok(body)
    }
}

impl Forward for CurlForwarder {
    /// Runs in the current thread; call from `spawn_blocking` if used from async code.
    fn forward(&self, req: &ForwardRequest) -> Result<Option<Value>, ForwardError> {
        if req.url.trim().is_empty() {
            return Err(ForwardError::InvalidUrl);
        }
        tracing::trace!(url = %req.url, "making forward request");
        let body = self.perform(req).map_err(|source| ForwardError::Transport {
            url: req.url.clone(),
            source,
        })?;
        Ok(decode_response(&body))
    }
}

/// `name=value` with form-urlencoding (spaces as `+`).
pub fn encode_form_body(name: &str, value: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair(name, value)
        .finish()
}

/// Decode a response body as JSON; empty or malformed bodies give None.
pub fn decode_response(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        tracing::debug!("empty forward response");
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => None,
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("forward response is not JSON: {}", e);
            None
        }
    }
}
