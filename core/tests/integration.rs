//! Dispatcher and task client against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every dispatcher
//! verb and every client operation over real HTTP through `UreqTransport`.
//! Validates that header construction, status classification and the task
//! schema agree with the actual server.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use serde_json::json;
use tasks_core::media::JSON;
use tasks_core::{
    ApiError, ClientConfig, DispatchError, Dispatcher, Mode, NewTask, Outcome, Task, TaskClient,
    TaskStatus, TaskUpdate, TransportError,
};

/// Start the mock server on its own thread and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            tasks_mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Answer a single connection with `response` once the request head arrives.
fn serve_once(response: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                return;
            }
            head.extend_from_slice(&buf[..n]);
        }
        stream.write_all(&response).unwrap();
    });

    addr
}

/// Accept connections and hold them open without ever replying.
fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            held.push(stream);
        }
    });

    addr
}

fn ok_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn dispatcher() -> Dispatcher {
    Dispatcher::with_timeout(Some(Duration::from_secs(5)))
}

fn success_body(outcome: Outcome) -> String {
    match outcome {
        Outcome::Success(body) => body,
        Outcome::Failure(status) => panic!("expected success, got {status}"),
    }
}

#[test]
fn dispatcher_verbs_against_live_server() {
    let addr = start_server();
    let tasks = format!("http://{addr}/tasks");
    let d = dispatcher();

    // create: 201 with the stored task as raw text
    let body = success_body(
        d.create(
            &tasks,
            &json!({"description": "buy milk"}),
            JSON,
            Mode::Synchronous,
            None,
        )
        .unwrap()
        .wait()
        .unwrap(),
    );
    let created: Task = serde_json::from_str(&body).unwrap();
    assert_eq!(created.description, "buy milk");
    assert_eq!(created.status, TaskStatus::Pending);

    // read failure: unknown id is a 404 failure outcome
    let outcome = d
        .read(&format!("{tasks}/99"), JSON, Mode::Synchronous)
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(outcome, Outcome::Failure(404));

    // update: 200 with the new body text
    let item = format!("{tasks}/{}", created.id);
    let body = success_body(
        d.update(
            &item,
            &json!({"description": "milk", "status": "TERMINADO"}),
            JSON,
            Mode::Synchronous,
            Some(JSON),
        )
        .unwrap()
        .wait()
        .unwrap(),
    );
    let updated: Task = serde_json::from_str(&body).unwrap();
    assert_eq!(updated.description, "milk");
    assert_eq!(updated.status, TaskStatus::Done);

    // delete: 204 with an empty body
    let outcome = d.delete(&item, JSON, Mode::Synchronous).unwrap().wait().unwrap();
    assert_eq!(outcome, Outcome::Success(String::new()));

    // delete again: 404
    let outcome = d.delete(&item, JSON, Mode::Synchronous).unwrap().wait().unwrap();
    assert_eq!(outcome, Outcome::Failure(404));
}

#[test]
fn continuations_fire_exactly_once() {
    let addr = start_server();
    let d = dispatcher();

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    d.read(&format!("http://{addr}/tasks/99"), JSON, Mode::Synchronous)
        .unwrap()
        .wait()
        .unwrap()
        .resolve(|body| successes.push(body), |status| failures.push(status));

    assert!(successes.is_empty());
    assert_eq!(failures, vec![404]);
}

#[tokio::test(flavor = "multi_thread")]
async fn asynchronous_dispatches_can_be_awaited() {
    let addr = start_server();
    let tasks = format!("http://{addr}/tasks");
    let d = dispatcher();

    let pendings: Vec<_> = ["one", "two", "three"]
        .iter()
        .map(|description| {
            d.create(
                &tasks,
                &json!({ "description": description }),
                JSON,
                Mode::Asynchronous,
                None,
            )
            .unwrap()
        })
        .collect();

    let mut ids = Vec::new();
    for pending in pendings {
        let body = success_body(pending.await.unwrap());
        let created: Task = serde_json::from_str(&body).unwrap();
        ids.push(created.id);
    }
    // Completion order is not guaranteed, but every id is distinct.
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    let listed = success_body(d.read(&tasks, JSON, Mode::Asynchronous).unwrap().await.unwrap());
    let listed: Vec<Task> = serde_json::from_str(&listed).unwrap();
    assert_eq!(listed.len(), 3);
}

#[test]
fn unreachable_server_is_a_transport_fault() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = dispatcher()
        .read(&format!("http://127.0.0.1:{port}/tasks"), JSON, Mode::Synchronous)
        .unwrap()
        .wait()
        .unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)), "{err:?}");
}

#[test]
fn invalid_utf8_success_body_is_still_a_success() {
    let addr = serve_once(ok_response(b"{\xff\xfe}"));
    let outcome = dispatcher()
        .read(&format!("http://{addr}/tasks"), JSON, Mode::Synchronous)
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(outcome, Outcome::Success("{\u{fffd}\u{fffd}}".to_string()));
}

#[test]
fn large_success_body_is_read_in_full() {
    let body = vec![b'a'; 11 * 1024 * 1024];
    let addr = serve_once(ok_response(&body));
    let outcome = dispatcher()
        .read(&format!("http://{addr}/tasks"), JSON, Mode::Synchronous)
        .unwrap()
        .wait()
        .unwrap();
    match outcome {
        Outcome::Success(text) => assert_eq!(text.len(), body.len()),
        Outcome::Failure(status) => panic!("expected success, got {status}"),
    }
}

#[test]
fn silent_server_times_out() {
    let addr = silent_server();
    let err = Dispatcher::with_timeout(Some(Duration::from_millis(200)))
        .read(&format!("http://{addr}/tasks"), JSON, Mode::Synchronous)
        .unwrap()
        .wait()
        .unwrap_err();
    assert!(matches!(err, DispatchError::Transport(TransportError::Timeout(_))), "{err:?}");
}

#[test]
fn task_client_crud_lifecycle() {
    let addr = start_server();
    let client = TaskClient::new(&ClientConfig::new(&format!("http://{addr}/tasks/")));

    // Step 1: list: should be empty.
    assert!(client.list_tasks().unwrap().is_empty(), "expected empty list");

    // Step 2: create a task.
    let created = client.create_task(&NewTask::new("Integration test")).unwrap();
    assert_eq!(created.description, "Integration test");
    assert_eq!(created.status, TaskStatus::Pending);
    assert!(created.date.is_some());
    let id = created.id;

    // Step 3: get the created task.
    assert_eq!(client.get_task(id).unwrap(), created);

    // Step 4: edit the description.
    let update = TaskUpdate {
        description: Some("Updated description".to_string()),
        ..TaskUpdate::default()
    };
    let updated = client.update_task(id, &update).unwrap();
    assert_eq!(updated.description, "Updated description");
    assert_eq!(updated.status, TaskStatus::Pending);

    // Step 5: tick the checkbox.
    let updated = client.set_status(id, TaskStatus::from_checked(true)).unwrap();
    assert_eq!(updated.description, "Updated description");
    assert_eq!(updated.status, TaskStatus::Done);

    // Step 6: list: should have one item.
    assert_eq!(client.list_tasks().unwrap().len(), 1);

    // Step 7: delete.
    client.delete_task(id).unwrap();

    // Step 8: get after delete: should be NotFound.
    assert!(matches!(client.get_task(id), Err(ApiError::NotFound)));

    // Step 9: delete again: should be NotFound.
    assert!(matches!(client.delete_task(id), Err(ApiError::NotFound)));

    // Step 10: list: should be empty again.
    assert!(client.list_tasks().unwrap().is_empty(), "expected empty list after delete");
}
