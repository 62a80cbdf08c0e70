//! HTTP status codes and their success/failure classification.

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const NO_CONTENT: u16 = 204;
pub const NOT_MODIFIED: u16 = 304;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

/// Status codes that resolve an exchange as a success. Every other code,
/// including 0 from a transport that never got a response, is a failure.
pub const SUCCESS_CODES: [u16; 4] = [OK, CREATED, NO_CONTENT, NOT_MODIFIED];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Failure,
}

pub fn classify(code: u16) -> StatusClass {
    if SUCCESS_CODES.contains(&code) {
        StatusClass::Success
    } else {
        StatusClass::Failure
    }
}
