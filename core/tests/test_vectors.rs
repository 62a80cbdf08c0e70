//! Verify dispatcher behavior against JSON test vectors stored in `test-vectors/`.
//!
//! Each dispatch vector describes a call, the request it must produce, a
//! simulated response, and the expected outcome. Request bodies are compared
//! as parsed JSON (not raw strings) to avoid false negatives from field
//! ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tasks_core::media::JSON;
use tasks_core::{
    accept_header, content_type_header, DispatchError, Dispatcher, HttpMethod, HttpRequest,
    HttpResponse, Mode, Outcome, Transport, TransportError,
};

/// Replies with one simulated response and keeps every request it sees.
struct Simulated {
    response: HttpResponse,
    calls: AtomicUsize,
    seen: Mutex<Vec<HttpRequest>>,
}

impl Simulated {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: HttpResponse::new(status, body),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl Transport for Simulated {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn expected_outcome(v: &Value) -> Outcome {
    if let Some(body) = v.get("success") {
        Outcome::Success(body.as_str().unwrap().to_string())
    } else {
        Outcome::Failure(v["failure"].as_u64().unwrap() as u16)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn dispatch_test_vectors() {
    let raw = include_str!("../../test-vectors/dispatch.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let locator = case["locator"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let transport = Simulated::new(
            sim["status"].as_u64().unwrap() as u16,
            sim["body"].as_str().unwrap(),
        );
        let d = Dispatcher::from_shared(transport.clone());
        let payload = &case["payload"];

        let pending = match case["operation"].as_str().unwrap() {
            "create" => d.create(locator, payload, JSON, Mode::Synchronous, None),
            "read" => d.read(locator, JSON, Mode::Synchronous),
            "update" => d.update(locator, payload, JSON, Mode::Synchronous, Some(JSON)),
            "delete" => d.delete(locator, JSON, Mode::Synchronous),
            other => panic!("{name}: unknown operation {other}"),
        }
        .unwrap();
        let outcome = pending.wait().unwrap();

        // Verify request
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "{name}: exactly one exchange");
        let req = &seen[0];
        let expected_req = &case["expected_request"];
        let expected_method = parse_method(expected_req["method"].as_str().unwrap());
        assert_eq!(req.method, expected_method, "{name}: method");
        assert_eq!(req.url, locator, "{name}: url");

        let headers: Vec<(String, String)> = req
            .headers
            .iter()
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect();
        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(headers, expected_headers, "{name}: headers");

        match &expected_req["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: body should be None"),
            expected => {
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&body, expected, "{name}: body");
            }
        }

        // Verify outcome
        assert_eq!(outcome, expected_outcome(&case["expected_outcome"]), "{name}: outcome");
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[test]
fn media_test_vectors() {
    let raw = include_str!("../../test-vectors/media.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for media in vectors["supported"].as_array().unwrap() {
        let media = media.as_str().unwrap();
        assert_eq!(accept_header(media).unwrap().value, media);
        assert_eq!(content_type_header(media).unwrap().value, media);
    }

    for media in vectors["unsupported"].as_array().unwrap() {
        let media = media.as_str().unwrap();
        let transport = Simulated::new(200, "");
        let d = Dispatcher::from_shared(transport.clone());
        let payload = serde_json::json!({"description": "x"});

        assert!(accept_header(media).is_err(), "{media:?}: accept");
        assert!(content_type_header(media).is_err(), "{media:?}: content-type");

        let attempts = [
            d.read("/tasks", media, Mode::Synchronous),
            d.delete("/tasks/1", media, Mode::Synchronous),
            d.create("/tasks", &payload, JSON, Mode::Synchronous, Some(media)),
            d.update("/tasks/1", &payload, media, Mode::Synchronous, None),
            d.send(
                HttpMethod::Post,
                Some(&payload),
                "/tasks",
                Vec::new(),
                Mode::Asynchronous,
                Some(media),
            ),
        ];
        for attempt in attempts {
            assert!(
                matches!(attempt, Err(DispatchError::UnsupportedMediaFormat(ref m)) if m == media),
                "{media:?}: dispatch should reject"
            );
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0, "{media:?}: no exchange");
    }
}
