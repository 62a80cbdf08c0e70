//! HTTP request dispatcher for the task list API.
//!
//! # Overview
//! `Dispatcher` performs one HTTP exchange per call and resolves it to
//! exactly one `Outcome`: the raw body text for a success status
//! (200, 201, 204, 304) or the raw status code for anything else.
//! `TaskClient` layers typed CRUD operations over it.
//!
//! # Design
//! - Media formats are validated before a request is opened; an unsupported
//!   one is a `DispatchError`, never an `Outcome`.
//! - Exchanges run inline (`Mode::Synchronous`) or on a worker thread
//!   (`Mode::Asynchronous`). Either way the caller gets a `Pending` that can
//!   be waited on or awaited.
//! - All I/O sits behind the `Transport` trait; `UreqTransport` is the
//!   network implementation.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod exchange;
pub mod http;
pub mod media;
pub mod status;
pub mod transport;
pub mod types;

pub use client::TaskClient;
pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, Mode, Pending};
pub use error::{ApiError, DispatchError};
pub use exchange::{Exchange, Outcome, ReadyState};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use media::{accept_header, content_type_header, Header, MediaFormat};
pub use status::{classify, StatusClass};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{NewTask, Task, TaskStatus, TaskUpdate};
