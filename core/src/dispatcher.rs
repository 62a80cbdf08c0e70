//! Verb-specific entry points funnelling into one generic executor.
//!
//! # Design
//! Every call is split in two. `prepare` validates media formats, builds the
//! header list and serializes the payload; it performs no I/O, so every
//! caller mistake surfaces as an `Err` before a request is opened.
//! `dispatch` then runs the exchange either inline (`Mode::Synchronous`) or
//! on a dedicated worker thread (`Mode::Asynchronous`).
//!
//! Each call owns its exchange exclusively. The only thing shared between
//! calls is the transport handle, which is immutable. Nothing orders
//! concurrent exchanges; their results arrive whenever their responses do.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::DispatchError;
use crate::exchange::{Exchange, Outcome};
use crate::http::HttpMethod;
use crate::media::{self, accept_header, content_type_header, Header, MediaFormat};
use crate::transport::{Transport, TransportError, UreqTransport};

/// Whether a dispatch blocks the calling thread until the exchange is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Synchronous,
    Asynchronous,
}

impl Mode {
    pub fn from_async_flag(asynchronous: bool) -> Self {
        if asynchronous {
            Mode::Asynchronous
        } else {
            Mode::Synchronous
        }
    }
}

type ExchangeResult = Result<Outcome, DispatchError>;

/// The eventual result of a dispatched exchange.
///
/// Await it from async code or call `wait` from blocking code. A
/// synchronous dispatch returns a `Pending` that is already resolved.
#[derive(Debug)]
pub struct Pending {
    inner: PendingInner,
}

#[derive(Debug)]
enum PendingInner {
    Ready(Option<ExchangeResult>),
    Deferred(oneshot::Receiver<ExchangeResult>),
}

impl Pending {
    fn ready(result: ExchangeResult) -> Self {
        Self {
            inner: PendingInner::Ready(Some(result)),
        }
    }

    fn deferred(rx: oneshot::Receiver<ExchangeResult>) -> Self {
        Self {
            inner: PendingInner::Deferred(rx),
        }
    }

    /// True if the exchange was run before the dispatch call returned.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, PendingInner::Ready(_))
    }

    /// Block until the exchange is done.
    ///
    /// Must not be called on a deferred `Pending` from inside an async
    /// runtime; `.await` it instead.
    pub fn wait(self) -> ExchangeResult {
        match self.inner {
            PendingInner::Ready(result) => result.unwrap_or(Err(DispatchError::Abandoned)),
            PendingInner::Deferred(rx) => {
                rx.blocking_recv().unwrap_or(Err(DispatchError::Abandoned))
            }
        }
    }
}

impl Future for Pending {
    type Output = ExchangeResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            PendingInner::Ready(result) => {
                Poll::Ready(result.take().unwrap_or(Err(DispatchError::Abandoned)))
            }
            PendingInner::Deferred(rx) => Pin::new(rx)
                .poll(cx)
                .map(|r| r.unwrap_or(Err(DispatchError::Abandoned))),
        }
    }
}

/// Issues HTTP exchanges and classifies their outcome.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(UreqTransport::default())
    }
}

impl Dispatcher {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Dispatcher over the network with the given per-exchange timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self::new(UreqTransport::new(timeout))
    }

    /// POST `payload` to `locator`. Attaches `Content-Type` only.
    ///
    /// `accept` is neither validated nor sent.
    pub fn create<P: Serialize + ?Sized>(
        &self,
        locator: &str,
        payload: &P,
        accept: &str,
        mode: Mode,
        body_format: Option<&str>,
    ) -> Result<Pending, DispatchError> {
        let exchange = self.prepare_create(locator, payload, accept, body_format)?;
        Ok(self.dispatch(exchange, mode))
    }

    /// GET `locator`. Attaches `Accept` only and sends no body.
    pub fn read(&self, locator: &str, accept: &str, mode: Mode) -> Result<Pending, DispatchError> {
        let exchange = self.prepare_read(locator, accept)?;
        Ok(self.dispatch(exchange, mode))
    }

    /// PUT `payload` to `locator`. Attaches `Content-Type` and `Accept`.
    pub fn update<P: Serialize + ?Sized>(
        &self,
        locator: &str,
        payload: &P,
        accept: &str,
        mode: Mode,
        body_format: Option<&str>,
    ) -> Result<Pending, DispatchError> {
        let exchange = self.prepare_update(locator, payload, accept, body_format)?;
        Ok(self.dispatch(exchange, mode))
    }

    /// DELETE `locator`. Attaches `Accept` only and sends no body.
    pub fn delete(
        &self,
        locator: &str,
        accept: &str,
        mode: Mode,
    ) -> Result<Pending, DispatchError> {
        let exchange = self.prepare_delete(locator, None::<&()>, accept)?;
        Ok(self.dispatch(exchange, mode))
    }

    /// Generic executor: prepare an exchange and dispatch it.
    ///
    /// `body_format` defaults to JSON. An unsupported format fails before any
    /// transport call.
    pub fn send<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        payload: Option<&P>,
        locator: &str,
        headers: Vec<Header>,
        mode: Mode,
        body_format: Option<&str>,
    ) -> Result<Pending, DispatchError> {
        let exchange = self.prepare(method, payload, locator, headers, body_format)?;
        Ok(self.dispatch(exchange, mode))
    }

    pub fn prepare_create<P: Serialize + ?Sized>(
        &self,
        locator: &str,
        payload: &P,
        _accept: &str,
        body_format: Option<&str>,
    ) -> Result<Exchange, DispatchError> {
        let body_format = body_format.unwrap_or(media::JSON);
        let headers = vec![content_type_header(body_format)?];
        self.prepare(HttpMethod::Post, Some(payload), locator, headers, Some(body_format))
    }

    pub fn prepare_read(&self, locator: &str, accept: &str) -> Result<Exchange, DispatchError> {
        let headers = vec![accept_header(accept)?];
        self.prepare::<()>(HttpMethod::Get, None, locator, headers, None)
    }

    pub fn prepare_update<P: Serialize + ?Sized>(
        &self,
        locator: &str,
        payload: &P,
        accept: &str,
        body_format: Option<&str>,
    ) -> Result<Exchange, DispatchError> {
        let body_format = body_format.unwrap_or(media::JSON);
        let headers = vec![content_type_header(body_format)?, accept_header(accept)?];
        self.prepare(HttpMethod::Put, Some(payload), locator, headers, Some(body_format))
    }

    /// A DELETE exchange. A `payload`, if given, is passed through as the body.
    pub fn prepare_delete<P: Serialize + ?Sized>(
        &self,
        locator: &str,
        payload: Option<&P>,
        accept: &str,
    ) -> Result<Exchange, DispatchError> {
        let headers = vec![accept_header(accept)?];
        self.prepare(HttpMethod::Delete, payload, locator, headers, None)
    }

    /// Validate and assemble an exchange without sending it.
    pub fn prepare<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        payload: Option<&P>,
        locator: &str,
        headers: Vec<Header>,
        body_format: Option<&str>,
    ) -> Result<Exchange, DispatchError> {
        let format = MediaFormat::parse(body_format.unwrap_or(media::JSON))?;
        let body = payload.map(|p| encode(format, p)).transpose()?;

        let mut exchange = Exchange::open(method, locator);
        for header in headers {
            exchange.set_header(header);
        }
        exchange.set_body(body);
        Ok(exchange)
    }

    /// Run a prepared exchange and return a handle to its result.
    pub fn dispatch(&self, exchange: Exchange, mode: Mode) -> Pending {
        match mode {
            Mode::Synchronous => {
                log_dispatch(&exchange, mode);
                Pending::ready(exchange.run(self.transport.as_ref()))
            }
            Mode::Asynchronous => {
                let (tx, rx) = oneshot::channel();
                self.dispatch_with(exchange, mode, move |result| {
                    // The receiver may already be gone; nobody is left to tell.
                    let _ = tx.send(result);
                });
                Pending::deferred(rx)
            }
        }
    }

    /// Run a prepared exchange and hand its result to `complete`, exactly once.
    ///
    /// In `Synchronous` mode `complete` runs before this returns. In
    /// `Asynchronous` mode it runs on the exchange's worker thread.
    pub fn dispatch_with<F>(&self, exchange: Exchange, mode: Mode, complete: F)
    where
        F: FnOnce(Result<Outcome, DispatchError>) + Send + 'static,
    {
        log_dispatch(&exchange, mode);

        match mode {
            Mode::Synchronous => complete(exchange.run(self.transport.as_ref())),
            Mode::Asynchronous => {
                let transport = Arc::clone(&self.transport);
                let job = Arc::new(Mutex::new(Some((exchange, complete))));
                let worker_job = Arc::clone(&job);

                let spawned = thread::Builder::new()
                    .name("tasks-exchange".to_string())
                    .spawn(move || {
                        if let Some((exchange, complete)) = take(&worker_job) {
                            complete(exchange.run(transport.as_ref()));
                        }
                    });

                if let Err(e) = spawned {
                    if let Some((_, complete)) = take(&job) {
                        complete(Err(TransportError::Io(e.to_string()).into()));
                    }
                }
            }
        }
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn log_dispatch(exchange: &Exchange, mode: Mode) {
    debug!(
        method = %exchange.request().method,
        url = %exchange.request().url,
        ?mode,
        "dispatch"
    );
}

fn encode<P: Serialize + ?Sized>(
    format: MediaFormat,
    payload: &P,
) -> Result<String, DispatchError> {
    match format {
        MediaFormat::Json => Ok(serde_json::to_string(payload)?),
    }
}
