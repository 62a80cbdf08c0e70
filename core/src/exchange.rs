//! A single request/response exchange and its outcome.
//!
//! # Design
//! An `Exchange` is opened with a method and URL, collects headers and an
//! optional body, and is then run exactly once against a `Transport`.
//! `run` takes `self` by value, so an exchange cannot be run twice and its
//! outcome cannot be delivered twice.
//!
//! The readiness states mirror what a browser request object reports.
//! Classification happens only at `Done`; the intermediate `InFlight` state
//! is tracked but never acted on.

use tracing::{debug, trace};

use crate::error::DispatchError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::media::Header;
use crate::status::{classify, StatusClass};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Opened,
    InFlight,
    Done,
}

/// How an exchange resolved: the raw body on success, the raw status code
/// on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(u16),
}

impl Outcome {
    /// Classify a completed response.
    pub fn from_response(response: HttpResponse) -> Self {
        match classify(response.status) {
            StatusClass::Success => Outcome::Success(response.body),
            StatusClass::Failure => Outcome::Failure(response.status),
        }
    }

    /// Hand the outcome to exactly one of two continuations.
    pub fn resolve<R>(
        self,
        on_success: impl FnOnce(String) -> R,
        on_failure: impl FnOnce(u16) -> R,
    ) -> R {
        match self {
            Outcome::Success(body) => on_success(body),
            Outcome::Failure(status) => on_failure(status),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// An opened, not yet sent, HTTP exchange.
#[derive(Debug)]
pub struct Exchange {
    request: HttpRequest,
    state: ReadyState,
}

impl Exchange {
    pub fn open(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            request: HttpRequest {
                method,
                url: url.into(),
                headers: Vec::new(),
                body: None,
            },
            state: ReadyState::Opened,
        }
    }

    pub fn set_header(&mut self, header: Header) {
        self.request.headers.push(header);
    }

    pub fn set_body(&mut self, body: Option<String>) {
        self.request.body = body;
    }

    pub fn state(&self) -> ReadyState {
        self.state
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Send the request and classify its response once it is `Done`.
    pub fn run(mut self, transport: &dyn Transport) -> Result<Outcome, DispatchError> {
        self.advance(ReadyState::InFlight);
        let response = transport.execute(&self.request)?;
        self.advance(ReadyState::Done);

        debug!(
            method = %self.request.method,
            url = %self.request.url,
            status = response.status,
            "exchange done"
        );
        Ok(Outcome::from_response(response))
    }

    fn advance(&mut self, next: ReadyState) {
        trace!(from = ?self.state, to = ?next, url = %self.request.url, "exchange state");
        self.state = next;
    }
}
