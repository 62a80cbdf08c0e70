use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "TERMINADO")]
    Done,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub status: TaskStatus,
    pub date: String,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub date: Option<String>,
}

/// Tasks keyed by id; ids are handed out sequentially from 1.
#[derive(Debug, Default)]
pub struct Store {
    last_id: u64,
    tasks: BTreeMap<u64, Task>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

async fn list_tasks(State(db): State<Db>) -> Json<Vec<Task>> {
    let store = db.read().await;
    Json(store.tasks.values().cloned().collect())
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> (StatusCode, Json<Task>) {
    let mut store = db.write().await;
    store.last_id += 1;
    let task = Task {
        id: store.last_id,
        description: input.description,
        status: input.status,
        date: input.date.unwrap_or_else(now),
    };
    store.tasks.insert(task.id, task.clone());
    info!(id = task.id, "task created");
    (StatusCode::CREATED, Json(task))
}

async fn get_task(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Task>, StatusCode> {
    let store = db.read().await;
    store.tasks.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, StatusCode> {
    let mut store = db.write().await;
    let task = store.tasks.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(description) = input.description {
        task.description = description;
    }
    if let Some(status) = input.status {
        task.status = status;
    }
    if let Some(date) = input.date {
        task.date = date;
    }
    info!(id, status = ?task.status, "task updated");
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let removed = store.tasks.remove(&id).map(|_| StatusCode::NO_CONTENT);
    if removed.is_some() {
        info!(id, "task deleted");
    }
    removed.ok_or(StatusCode::NOT_FOUND)
}
