use serde::{Deserialize, Serialize};

/// Configuration for the profile_view module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileViewConfig {
    /// Path under the service base URL where uploaded pictures are served.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Placeholder avatar service, keyed by display name.
    #[serde(default = "default_placeholder_avatar_base")]
    pub placeholder_avatar_base: String,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Default for ProfileViewConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            placeholder_avatar_base: default_placeholder_avatar_base(),
            endpoints: Endpoints::default(),
        }
    }
}

fn default_storage_path() -> String {
    "storage/".to_string()
}

fn default_placeholder_avatar_base() -> String {
    "https://ui-avatars.com/api/".to_string()
}

/// Paths of the auth/profile service, relative to its base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub logout: String,
    pub current_user: String,
    pub update_profile: String,
    pub update_password: String,
    pub bookings: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/login".to_string(),
            register: "/api/register".to_string(),
            logout: "/api/logout".to_string(),
            current_user: "/api/user".to_string(),
            update_profile: "/api/profile".to_string(),
            update_password: "/api/profile/update-password".to_string(),
            bookings: "/api/user/bookings".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_endpoint_overrides_keep_defaults() {
        let cfg: ProfileViewConfig = serde_json::from_value(serde_json::json!({
            "endpoints": { "bookings": "/v2/bookings" }
        }))
        .unwrap();
        assert_eq!(cfg.endpoints.bookings, "/v2/bookings");
        assert_eq!(cfg.endpoints.login, "/api/login");
        assert_eq!(cfg.storage_path, "storage/");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<ProfileViewConfig, _> =
            serde_json::from_value(serde_json::json!({ "storage": "x" }));
        assert!(res.is_err());
    }
}
