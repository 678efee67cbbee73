//! Test assertions for response records.

use crate::state::Response;

/// Asserts that the response has the expected status.
pub fn assert_status(response: &Response, expected: u16) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {} (body: {:?})",
        expected, response.status, response.body
    );
}

/// Asserts that the response has the expected body.
pub fn assert_body(response: &Response, expected: &str) {
    assert_eq!(
        response.body, expected,
        "Expected body {:?}, got {:?}",
        expected, response.body
    );
}

/// Asserts that the response carries a header with the expected value.
pub fn assert_header(response: &Response, name: &str, expected: &str) {
    let actual = response.header(name);
    assert_eq!(
        actual,
        Some(expected),
        "Expected header '{}' to be {:?}, got {:?}. Headers: {:?}",
        name,
        expected,
        actual,
        response.headers.keys().collect::<Vec<_>>()
    );
}
