//! Tests for the domain error payload.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn base_error() -> Error {
    Error::service_unavailable("favourites store unavailable")
}

#[rstest]
#[case::invalid_request(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case::unauthenticated(Error::unauthenticated("no user"), ErrorCode::Unauthenticated)]
#[case::not_found(Error::not_found("missing"), ErrorCode::NotFound)]
#[case::conflict(Error::conflict("busy"), ErrorCode::Conflict)]
#[case::unavailable(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case::internal(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn display_uses_message(base_error: Error) {
    assert_eq!(base_error.to_string(), "favourites store unavailable");
}

#[rstest]
fn serialises_code_in_snake_case(base_error: Error) {
    let value = serde_json::to_value(base_error.with_details(json!({ "attempt": 1 })))
        .expect("error serialises");

    assert_eq!(value["code"], "service_unavailable");
    assert_eq!(value["details"]["attempt"], 1);
}

#[rstest]
fn deserialising_rejects_blank_messages() {
    let payload = json!({ "code": "not_found", "message": " " });
    let result = serde_json::from_value::<Error>(payload);
    assert!(result.is_err());
}

#[rstest]
fn details_are_omitted_when_absent(base_error: Error) {
    let value = serde_json::to_value(base_error).expect("error serialises");
    assert!(value.get("details").is_none());
}
