//! Task representations exchanged with the remote API.
//!
//! # Design
//! These types mirror the mock server's schema but are defined independently;
//! the integration tests catch drift between the two crates. Status values
//! keep the service's wire literals (`PENDIENTE` / `TERMINADO`).

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "TERMINADO")]
    Done,
}

impl TaskStatus {
    /// Status for a checkbox state: checked means done.
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }
}

/// A task as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Request payload for creating a task. The server assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl NewTask {
    /// A pending task stamped with the current UTC time.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: TaskStatus::Pending,
            date: Some(utc_date_string()),
        }
    }
}

/// Request payload for updating a task. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

/// Current time in the RFC 1123 form browsers emit, e.g.
/// `Tue, 14 Oct 2026 10:00:00 GMT`.
pub fn utc_date_string() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
