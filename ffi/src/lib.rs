//! C-ABI wrapper around `tasks-core`.
//!
//! # Overview
//! Exposes the four dispatcher verbs through `extern "C"` functions so any
//! language with a C FFI can issue task API requests and receive the result
//! through a success or failure callback.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Argument validation, media checks and payload parsing all happen before
//!   the exchange is opened. A non-`Ok` return code means no callback will
//!   ever fire; `Ok` means exactly one will.
//! - With `asynchronous == false` the callback fires before the function
//!   returns. Otherwise it fires later, on the exchange's worker thread, and
//!   `user_data` must stay valid until then.
//! - The C caller owns the dispatcher handle and must release it with
//!   `tasks_dispatcher_free`. Outstanding asynchronous exchanges keep their
//!   own reference to the transport and are unaffected.

pub mod types;

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use serde_json::Value;
use tasks_core::{Dispatcher, Mode};
use tracing::warn;

use types::*;

// ---------------------------------------------------------------------------
// Dispatcher lifecycle
// ---------------------------------------------------------------------------

/// Create a dispatcher whose exchanges time out after `timeout_ms`
/// milliseconds; `0` disables the timeout.
///
/// Returns null if an internal panic occurs.
/// The caller must free the returned pointer with `tasks_dispatcher_free`.
#[unsafe(no_mangle)]
pub extern "C" fn tasks_dispatcher_new(timeout_ms: u64) -> *mut FfiDispatcher {
    catch_unwind(|| {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        let dispatcher = Dispatcher::with_timeout(timeout);
        Box::into_raw(Box::new(FfiDispatcher { inner: dispatcher }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a dispatcher created by `tasks_dispatcher_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tasks_dispatcher_free(dispatcher: *mut FfiDispatcher) {
    if !dispatcher.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(dispatcher) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Request functions
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Verb {
    Post,
    Get,
    Put,
    Delete,
}

/// Arguments shared by every `tasks_send_*` function, as received from C.
struct RawRequest {
    dispatcher: *const FfiDispatcher,
    url: *const c_char,
    payload: *const c_char,
    accept: *const c_char,
    on_success: Option<FfiSuccessCallback>,
    on_failure: Option<FfiFailureCallback>,
    user_data: *mut c_void,
    asynchronous: bool,
    body_format: *const c_char,
}

/// Send a POST with `payload` (JSON text; null sends JSON `null`).
///
/// Attaches `Content-Type` from `body_format` (null means
/// `application/json`). `accept` must be valid UTF-8 but is otherwise
/// ignored.
#[unsafe(no_mangle)]
pub extern "C" fn tasks_send_post_request(
    dispatcher: *const FfiDispatcher,
    url: *const c_char,
    payload: *const c_char,
    accept: *const c_char,
    on_success: Option<FfiSuccessCallback>,
    on_failure: Option<FfiFailureCallback>,
    user_data: *mut c_void,
    asynchronous: bool,
    body_format: *const c_char,
) -> FfiDispatchCode {
    send_request(
        Verb::Post,
        RawRequest {
            dispatcher,
            url,
            payload,
            accept,
            on_success,
            on_failure,
            user_data,
            asynchronous,
            body_format,
        },
    )
}

/// Send a GET. Attaches `Accept`; `payload` is ignored.
#[unsafe(no_mangle)]
pub extern "C" fn tasks_send_get_request(
    dispatcher: *const FfiDispatcher,
    url: *const c_char,
    payload: *const c_char,
    accept: *const c_char,
    on_success: Option<FfiSuccessCallback>,
    on_failure: Option<FfiFailureCallback>,
    user_data: *mut c_void,
    asynchronous: bool,
) -> FfiDispatchCode {
    send_request(
        Verb::Get,
        RawRequest {
            dispatcher,
            url,
            payload,
            accept,
            on_success,
            on_failure,
            user_data,
            asynchronous,
            body_format: std::ptr::null(),
        },
    )
}

/// Send a PUT with `payload`. Attaches `Content-Type` and `Accept`.
#[unsafe(no_mangle)]
pub extern "C" fn tasks_send_put_request(
    dispatcher: *const FfiDispatcher,
    url: *const c_char,
    payload: *const c_char,
    accept: *const c_char,
    on_success: Option<FfiSuccessCallback>,
    on_failure: Option<FfiFailureCallback>,
    user_data: *mut c_void,
    asynchronous: bool,
    body_format: *const c_char,
) -> FfiDispatchCode {
    send_request(
        Verb::Put,
        RawRequest {
            dispatcher,
            url,
            payload,
            accept,
            on_success,
            on_failure,
            user_data,
            asynchronous,
            body_format,
        },
    )
}

/// Send a DELETE. Attaches `Accept`; a non-null `payload` is passed through
/// as the body.
#[unsafe(no_mangle)]
pub extern "C" fn tasks_send_delete_request(
    dispatcher: *const FfiDispatcher,
    url: *const c_char,
    payload: *const c_char,
    accept: *const c_char,
    on_success: Option<FfiSuccessCallback>,
    on_failure: Option<FfiFailureCallback>,
    user_data: *mut c_void,
    asynchronous: bool,
) -> FfiDispatchCode {
    send_request(
        Verb::Delete,
        RawRequest {
            dispatcher,
            url,
            payload,
            accept,
            on_success,
            on_failure,
            user_data,
            asynchronous,
            body_format: std::ptr::null(),
        },
    )
}

fn send_request(verb: Verb, raw: RawRequest) -> FfiDispatchCode {
    catch_unwind(AssertUnwindSafe(|| match send_request_inner(verb, raw) {
        Ok(()) => FfiDispatchCode::Ok,
        Err(code) => code,
    }))
    .unwrap_or(FfiDispatchCode::Panic)
}

fn send_request_inner(verb: Verb, raw: RawRequest) -> Result<(), FfiDispatchCode> {
    if raw.dispatcher.is_null() {
        return Err(FfiDispatchCode::NullArg);
    }
    let (Some(on_success), Some(on_failure)) = (raw.on_success, raw.on_failure) else {
        return Err(FfiDispatchCode::NullArg);
    };
    let dispatcher = &unsafe { &*raw.dispatcher }.inner;
    let url = required_str(raw.url)?;
    let accept = required_str(raw.accept)?;
    let body_format = optional_str(raw.body_format)?;
    let payload = parse_payload(raw.payload)?;

    let prepared = match verb {
        Verb::Post => {
            dispatcher.prepare_create(url, &payload.unwrap_or(Value::Null), accept, body_format)
        }
        Verb::Get => dispatcher.prepare_read(url, accept),
        Verb::Put => {
            dispatcher.prepare_update(url, &payload.unwrap_or(Value::Null), accept, body_format)
        }
        Verb::Delete => dispatcher.prepare_delete(url, payload.as_ref(), accept),
    };
    let exchange = prepared.map_err(|e| {
        warn!(error = %e, url, "request rejected before dispatch");
        FfiDispatchCode::from(&e)
    })?;

    let continuations = Continuations::new(on_success, on_failure, raw.user_data);
    dispatcher.dispatch_with(exchange, Mode::from_async_flag(raw.asynchronous), move |result| {
        continuations.deliver(result)
    });
    Ok(())
}

fn required_str<'a>(ptr: *const c_char) -> Result<&'a str, FfiDispatchCode> {
    optional_str(ptr)?.ok_or(FfiDispatchCode::NullArg)
}

fn optional_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, FfiDispatchCode> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(Some)
        .map_err(|_| FfiDispatchCode::InvalidUtf8)
}

fn parse_payload(ptr: *const c_char) -> Result<Option<Value>, FfiDispatchCode> {
    match optional_str(ptr)? {
        None => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|_| FfiDispatchCode::InvalidPayload),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
