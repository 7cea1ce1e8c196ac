use reqwest::StatusCode;
use serde_json::Value;

use crate::contract::error::{FieldErrors, ProfileError};
use crate::contract::model::{BookingRecord, BookingStatus, Credential, Session, SignedIn};
use crate::infra::http::dto::{AuthResponse, BookingDto, ErrorPayload, UserDto};

pub fn user_to_session(user: UserDto) -> Session {
    Session {
        id: user.id,
        name: user.name,
        email: user.email,
        profile_picture: user.profile_picture.filter(|p| !p.trim().is_empty()),
    }
}

pub fn auth_to_signed_in(resp: AuthResponse) -> SignedIn {
    SignedIn {
        session: user_to_session(resp.user),
        credential: Credential::new(resp.token),
    }
}

pub fn booking_to_record(dto: BookingDto) -> BookingRecord {
    BookingRecord {
        id: dto.id,
        category: dto.category,
        subcategory: dto.subcategory,
        date: dto.date,
        time: dto.time,
        status: dto
            .status
            .as_deref()
            .map(BookingStatus::from_wire)
            .unwrap_or_default(),
        price: dto.price,
    }
}

/// Map a non-success response to a contract error.
///
/// 401/403 are auth failures; anything carrying a `message` or `errors`
/// is a validation failure; the rest is transport.
pub fn error_from_response(status: StatusCode, body: &[u8]) -> ProfileError {
    let payload: ErrorPayload = serde_json::from_slice(body).unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ProfileError::auth(payload.message);
    }

    let errors: Vec<FieldErrors> = payload
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|(field, v)| FieldErrors::new(field, messages(v)))
        .collect();

    if payload.message.is_some() || !errors.is_empty() {
        ProfileError::validation(payload.message, errors)
    } else {
        ProfileError::transport(format!("HTTP {status}"))
    }
}

fn messages(v: Value) -> Vec<String> {
    match v {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|i| match i {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

pub fn transport_error(e: reqwest::Error) -> ProfileError {
    ProfileError::transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_keep_payload_order() {
        let body = br#"{"errors":{"password":["too short"],"email":["taken"]}}"#;
        let err = error_from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.banner_message(), "too short, taken");
    }

    #[test]
    fn message_and_errors_become_validation() {
        let body = br#"{"message":"The email has already been taken.","errors":{"email":["taken"]}}"#;
        match error_from_response(StatusCode::UNPROCESSABLE_ENTITY, body) {
            ProfileError::Validation { message, errors } => {
                assert_eq!(message.as_deref(), Some("The email has already been taken."));
                assert_eq!(errors, vec![FieldErrors::new("email", ["taken"])]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unauthorized_is_auth() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, br#"{"message":"Invalid credentials"}"#);
        assert_eq!(err, ProfileError::auth(Some("Invalid credentials".into())));
        assert_eq!(
            error_from_response(StatusCode::FORBIDDEN, b""),
            ProfileError::auth(None)
        );
    }

    #[test]
    fn bodiless_failures_are_transport() {
        let err = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(err, ProfileError::transport("HTTP 500 Internal Server Error"));
    }

    #[test]
    fn single_string_field_error_is_accepted() {
        let err = error_from_response(StatusCode::BAD_REQUEST, br#"{"errors":{"name":"required"}}"#);
        assert_eq!(err.banner_message(), "required");
    }

    #[test]
    fn booking_status_defaults_to_unknown() {
        let record = booking_to_record(BookingDto::default());
        assert_eq!(record.status, BookingStatus::Unknown);
        let record = booking_to_record(BookingDto {
            status: Some("pending".into()),
            ..Default::default()
        });
        assert_eq!(record.status, BookingStatus::Pending);
    }
}
