use async_trait::async_trait;

use crate::contract::{
    error::ProfileError,
    model::{
        BookingRecord, Credential, PasswordChange, ProfileUpdate, Registration, Session, SignedIn,
    },
};

/// Operations owned by the external auth context.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a session.
    async fn login(&self, email: &str, password: &str) -> Result<SignedIn, ProfileError>;

    /// Create an account and sign it in.
    async fn register(&self, registration: Registration) -> Result<SignedIn, ProfileError>;

    /// Invalidate the token server-side.
    async fn logout(&self, credential: &Credential) -> Result<(), ProfileError>;

    /// Resolve the identity behind a previously issued token.
    async fn current_user(&self, credential: &Credential) -> Result<Session, ProfileError>;

    /// Update name, email and optionally the profile picture.
    async fn update_profile(
        &self,
        credential: &Credential,
        update: ProfileUpdate,
    ) -> Result<Session, ProfileError>;
}

/// Account endpoints that sit beside the auth context.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn update_password(
        &self,
        credential: &Credential,
        change: PasswordChange,
    ) -> Result<(), ProfileError>;

    async fn list_bookings(&self, credential: &Credential)
        -> Result<Vec<BookingRecord>, ProfileError>;
}
