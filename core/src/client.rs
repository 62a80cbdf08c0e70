//! Typed client for the task collection API.
//!
//! # Design
//! `TaskClient` holds a collection URL and a `Dispatcher` and nothing else.
//! Each operation runs one synchronous exchange and turns its `Outcome` into
//! typed data: a success body is decoded as JSON, a failure status becomes
//! an `ApiError`. The raw-text contract stays available through
//! `TaskClient::dispatcher` for callers that want it.

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, Mode, Pending};
use crate::error::ApiError;
use crate::media::JSON;
use crate::status::NOT_FOUND;
use crate::types::{NewTask, Task, TaskStatus, TaskUpdate};

#[derive(Debug, Clone)]
pub struct TaskClient {
    dispatcher: Dispatcher,
    base_url: String,
}

impl TaskClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_dispatcher(&config.base_url, Dispatcher::with_timeout(config.timeout))
    }

    pub fn with_dispatcher(base_url: &str, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn item_url(&self, id: u64) -> String {
        format!("{}/{id}", self.base_url)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let body = expect_success(self.dispatcher.read(&self.base_url, JSON, Mode::Synchronous)?)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        decode(&body)
    }

    pub fn get_task(&self, id: u64) -> Result<Task, ApiError> {
        let pending = self.dispatcher.read(&self.item_url(id), JSON, Mode::Synchronous)?;
        let body = expect_success(pending)?;
        decode(&body)
    }

    pub fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let pending = self
            .dispatcher
            .create(&self.base_url, task, JSON, Mode::Synchronous, None)?;
        decode(&expect_success(pending)?)
    }

    /// Apply `update` and return the stored task. An empty success body is
    /// followed by a re-read.
    pub fn update_task(&self, id: u64, update: &TaskUpdate) -> Result<Task, ApiError> {
        let pending = self
            .dispatcher
            .update(&self.item_url(id), update, JSON, Mode::Synchronous, None)?;
        let body = expect_success(pending)?;
        if body.trim().is_empty() {
            return self.get_task(id);
        }
        decode(&body)
    }

    pub fn set_status(&self, id: u64, status: TaskStatus) -> Result<Task, ApiError> {
        let update = TaskUpdate {
            status: Some(status),
            ..TaskUpdate::default()
        };
        self.update_task(id, &update)
    }

    pub fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        expect_success(self.dispatcher.delete(&self.item_url(id), JSON, Mode::Synchronous)?)?;
        Ok(())
    }
}

/// Wait for `pending` and return its body, mapping failure statuses to errors.
fn expect_success(pending: Pending) -> Result<String, ApiError> {
    pending.wait()?.resolve(Ok, |status| match status {
        NOT_FOUND => Err(ApiError::NotFound),
        status => Err(ApiError::Http { status }),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::EmptyBody);
    }
    Ok(serde_json::from_str(body)?)
}
