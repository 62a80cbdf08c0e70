//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The C surface keeps the two-continuation shape: a success callback that
//! receives the response body and a failure callback that receives the
//! status code, plus an opaque `user_data` pointer handed back to both.
//! `Continuations` owns that triple on the Rust side and consumes itself
//! when it fires, so at most one callback can ever run.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use tasks_core::{DispatchError, Outcome};
use tracing::warn;

/// Opaque handle to a `Dispatcher`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiDispatcher {
    pub(crate) inner: tasks_core::Dispatcher,
}

/// Status codes returned by the `tasks_send_*` functions.
///
/// Anything other than `Ok` means the request was rejected before it was
/// opened and neither callback will be invoked.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDispatchCode {
    Ok = 0,
    NullArg = 1,
    InvalidUtf8 = 2,
    UnsupportedMediaFormat = 3,
    InvalidPayload = 4,
    Panic = 5,
}

impl From<&DispatchError> for FfiDispatchCode {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::UnsupportedMediaFormat(_) => FfiDispatchCode::UnsupportedMediaFormat,
            DispatchError::Serialization(_) => FfiDispatchCode::InvalidPayload,
            // Only reachable after an exchange has started, which never
            // happens before a code is returned.
            DispatchError::Transport(_) | DispatchError::Abandoned => FfiDispatchCode::Panic,
        }
    }
}

/// Called with the raw response body. The pointer is only valid for the
/// duration of the call.
pub type FfiSuccessCallback = extern "C" fn(body: *const c_char, user_data: *mut c_void);

/// Called with the raw status code, or `0` when no response was received.
pub type FfiFailureCallback = extern "C" fn(status: u16, user_data: *mut c_void);

/// Status reported to the failure callback when the exchange produced no
/// response at all.
pub const NO_RESPONSE_STATUS: u16 = 0;

struct UserData(*mut c_void);

// The pointer is opaque to Rust and only ever handed back to the caller's
// own callbacks; the C side owns its thread-safety.
unsafe impl Send for UserData {}

pub(crate) struct Continuations {
    on_success: FfiSuccessCallback,
    on_failure: FfiFailureCallback,
    user_data: UserData,
}

impl Continuations {
    pub(crate) fn new(
        on_success: FfiSuccessCallback,
        on_failure: FfiFailureCallback,
        user_data: *mut c_void,
    ) -> Self {
        Self {
            on_success,
            on_failure,
            user_data: UserData(user_data),
        }
    }

    /// Invoke exactly one callback for `result`.
    pub(crate) fn deliver(self, result: Result<Outcome, DispatchError>) {
        let user_data = self.user_data.0;
        match result {
            Ok(Outcome::Success(body)) => {
                let body = to_c_string(body);
                (self.on_success)(body.as_ptr(), user_data);
            }
            Ok(Outcome::Failure(status)) => (self.on_failure)(status, user_data),
            Err(err) => {
                warn!(error = %err, "exchange failed without a response");
                (self.on_failure)(NO_RESPONSE_STATUS, user_data);
            }
        }
    }
}

/// Convert a response body to a C string, dropping interior NUL bytes.
fn to_c_string(body: String) -> CString {
    CString::new(body).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}
