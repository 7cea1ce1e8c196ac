use thiserror::Error;

/// Shown for failures that carry no structured payload.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Shown for rejected credentials when the server gives no message.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Messages reported by the server for one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    pub field: String,
    pub messages: Vec<String>,
}

impl FieldErrors {
    pub fn new(field: impl Into<String>, messages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            field: field.into(),
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Errors that reach the profile screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// Structured payload: a summary `message` and/or per-field messages (payload order).
    #[error("validation failed: {}", flatten(.message.as_deref(), .errors).unwrap_or_default())]
    Validation {
        message: Option<String>,
        errors: Vec<FieldErrors>,
    },

    #[error("authentication failed")]
    Auth { message: Option<String> },

    #[error("transport error: {detail}")]
    Transport { detail: String },

    #[error("New passwords do not match")]
    PasswordMismatch,

    #[error("You need to sign in first")]
    Unauthenticated,

    #[error("Unsupported file type '{content_type}', please choose an image")]
    UnsupportedFile { content_type: String },
}

impl ProfileError {
    pub fn validation(message: Option<String>, errors: Vec<FieldErrors>) -> Self {
        Self::Validation { message, errors }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Validation {
            message: None,
            errors: vec![FieldErrors::new(field, [message])],
        }
    }

    pub fn auth(message: Option<String>) -> Self {
        Self::Auth { message }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            detail: detail.into(),
        }
    }

    /// One-line text for the error banner.
    ///
    /// A non-empty summary message wins; otherwise all field messages are
    /// joined with ", " in payload order. Transport failures never leak
    /// their detail.
    pub fn banner_message(&self) -> String {
        match self {
            Self::Validation { message, errors } => {
                flatten(message.as_deref(), errors).unwrap_or_else(|| GENERIC_FAILURE.to_string())
            }
            Self::Auth { message } => message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(INVALID_CREDENTIALS)
                .to_string(),
            Self::Transport { .. } => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

fn flatten(message: Option<&str>, errors: &[FieldErrors]) -> Option<String> {
    if let Some(m) = message.filter(|m| !m.trim().is_empty()) {
        return Some(m.to_string());
    }
    let joined = errors
        .iter()
        .flat_map(|f| f.messages.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}
