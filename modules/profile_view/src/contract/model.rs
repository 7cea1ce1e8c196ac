use std::fmt;
use std::sync::Arc;

/// Authenticated identity and its profile attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Storage-relative reference assigned by the server, e.g. `profile_pictures/a.jpg`.
    pub profile_picture: Option<String>,
}

impl Session {
    /// Merge the server's answer to a profile update.
    ///
    /// Name and email always come from the server; the picture reference is
    /// only replaced when the server reports one.
    pub fn merge_update(&mut self, updated: Session) {
        self.name = updated.name;
        self.email = updated.email;
        if updated.profile_picture.is_some() {
            self.profile_picture = updated.profile_picture;
        }
    }
}

/// Bearer token issued at sign-in. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Result of a successful login, registration or restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub session: Session,
    pub credential: Credential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// A file picked by the user. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .split('/')
            .next()
            .is_some_and(|top| top.trim().eq_ignore_ascii_case("image"))
    }
}

/// Payload of a profile update: sent as multipart `name`, `email`, `profile_picture`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub picture: Option<SelectedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    #[default]
    Unknown,
}

impl BookingStatus {
    /// Map a wire value; anything unrecognised is `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }
}

/// Read-only booking row. Absent fields render as `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookingRecord {
    pub id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: BookingStatus,
    pub price: Option<String>,
}

impl BookingRecord {
    pub const MISSING: &'static str = "N/A";

    pub fn id_label(&self) -> String {
        format!("#{}", self.id.as_deref().unwrap_or(Self::MISSING))
    }

    pub fn price_label(&self) -> &str {
        self.price.as_deref().unwrap_or("0")
    }

    pub fn or_missing(field: &Option<String>) -> &str {
        field.as_deref().unwrap_or(Self::MISSING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Session {
        Session {
            id: 7,
            name: "Jane".into(),
            email: "jane@x.com".into(),
            profile_picture: Some("profile_pictures/old.png".into()),
        }
    }

    #[test]
    fn merge_keeps_picture_when_server_omits_it() {
        let mut s = jane();
        s.merge_update(Session {
            id: 7,
            name: "Jane D".into(),
            email: "jd@x.com".into(),
            profile_picture: None,
        });
        assert_eq!(s.name, "Jane D");
        assert_eq!(s.email, "jd@x.com");
        assert_eq!(s.profile_picture.as_deref(), Some("profile_pictures/old.png"));
    }

    #[test]
    fn merge_takes_new_picture() {
        let mut s = jane();
        s.merge_update(Session {
            profile_picture: Some("profile_pictures/new.png".into()),
            ..jane()
        });
        assert_eq!(s.profile_picture.as_deref(), Some("profile_pictures/new.png"));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let c = Credential::new("super-secret");
        assert_eq!(format!("{c:?}"), "Credential(***)");
        assert_eq!(c.bearer(), "super-secret");
    }

    #[test]
    fn image_detection_uses_top_level_type() {
        assert!(SelectedFile::new("a.png", "image/png", vec![1]).is_image());
        assert!(SelectedFile::new("a.jpg", "IMAGE/jpeg", vec![1]).is_image());
        assert!(!SelectedFile::new("a.pdf", "application/pdf", vec![1]).is_image());
        assert!(!SelectedFile::new("a", "", vec![]).is_image());
    }

    #[test]
    fn booking_status_and_labels() {
        assert_eq!(BookingStatus::from_wire("Confirmed"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::from_wire("canceled"), BookingStatus::Cancelled);
        assert_eq!(BookingStatus::from_wire("completed"), BookingStatus::Unknown);
        assert_eq!(BookingStatus::Pending.label(), "Pending");

        let empty = BookingRecord::default();
        assert_eq!(empty.id_label(), "#N/A");
        assert_eq!(empty.price_label(), "0");
        assert_eq!(BookingRecord::or_missing(&empty.date), "N/A");
        assert_eq!(empty.status.label(), "Unknown");
    }
}
