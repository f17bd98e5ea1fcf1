//! Pure functions for mapping group errors to HTTP status codes.
//!
//! The HTTP handlers themselves live outside this repository; this mapping
//! exists so that error-kind preservation has a single authoritative
//! translation.

use super::error::{ErrorKind, GroupError};

/// Maps a [`GroupError`] to an HTTP status code.
///
/// - `Validation` -> 400 (Bad Request)
/// - `NotFound` -> 404 (Not Found)
/// - `Conflict` -> 409 (Conflict)
/// - `Internal` -> 500 (Internal Server Error)
/// - `Unavailable` -> 503 (Service Unavailable)
pub fn group_error_to_status_code(error: &GroupError) -> u16 {
    match error.kind() {
        ErrorKind::Validation => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::Conflict => 409,
        ErrorKind::Internal => 500,
        ErrorKind::Unavailable => 503,
    }
}
