//! The transport seam between the dispatcher and the network.
//!
//! # Design
//! `Transport` is the only place I/O happens. It executes one `HttpRequest`
//! and reports whatever status the server produced, success or not; status
//! interpretation belongs to the dispatcher. An `Err` means the exchange
//! never produced a status at all.
//!
//! `UreqTransport` is the production implementation. Tests substitute an
//! in-memory transport.

use std::time::Duration;

use tracing::warn;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::media::Header;

/// Faults that prevent an exchange from reaching a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Io(String),
}

/// Executes HTTP requests on behalf of the dispatcher.
///
/// Implementations must be shareable across threads: asynchronous exchanges
/// run on worker threads that hold a handle to the same transport.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport over a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build a transport whose exchanges give up after `timeout`, or never
    /// when `None`.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[Header],
) -> ureq::RequestBuilder<B> {
    for header in headers {
        builder = builder.header(header.name.as_str(), header.value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match request.method {
            // GET bodies are dropped, as a browser transport would.
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Delete => {
                let builder = with_headers(self.agent.delete(url), headers);
                match body {
                    Some(body) => builder.force_send_body().send(body.as_bytes()),
                    None => builder.call(),
                }
            }
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| fault(request, e))?;

        // The body is decoded lossily and without a size cap, like a
        // browser's `responseText`.
        let status = response.status().as_u16();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| fault(request, e))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse { status, body })
    }
}

fn fault(request: &HttpRequest, err: ureq::Error) -> TransportError {
    warn!(method = %request.method, url = %request.url, error = %err, "transport fault");
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
        other => TransportError::Io(other.to_string()),
    }
}
