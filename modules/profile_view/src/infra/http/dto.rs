use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// User as returned by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Body of a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserDto,
    #[serde(alias = "access_token")]
    pub token: String,
}

/// Some endpoints answer with the bare user, others wrap it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserEnvelope {
    Wrapped { user: UserDto },
    Bare(UserDto),
}

impl UserEnvelope {
    pub fn into_user(self) -> UserDto {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingsResponse {
    #[serde(default)]
    pub bookings: Vec<BookingDto>,
}

/// Booking row. Every field is optional and ids/prices may be numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingDto {
    #[serde(deserialize_with = "stringish")]
    pub id: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub category: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub subcategory: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub date: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub time: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub status: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub price: Option<String>,
}

/// Accept strings, numbers and booleans; null and "" become `None`.
fn stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginReq<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterReq<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePasswordReq<'a> {
    pub current_password: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

/// Error body: `{message?, errors?: {field: [msg, ...]}}`.
///
/// `errors` keeps the order of the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Map<String, Value>>,
}
