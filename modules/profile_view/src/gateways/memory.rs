//! In-process stand-in for the auth/profile service.
//!
//! Used by the shell's offline mode and by tests. It validates input the
//! way the real service does and answers with the same error payload
//! shapes, so the screen behaves identically against both.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::contract::{
    client::{AccountApi, AuthApi},
    error::{FieldErrors, ProfileError},
    model::{
        BookingRecord, BookingStatus, Credential, PasswordChange, ProfileUpdate, Registration,
        Session, SignedIn,
    },
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
struct Account {
    session: Session,
    password: String,
    bookings: Vec<BookingRecord>,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    accounts: HashMap<u64, Account>,
    tokens: HashMap<String, u64>,
}

impl Store {
    fn by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.session.email.eq_ignore_ascii_case(email))
    }

    fn issue(&mut self, id: u64) -> Credential {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), id);
        Credential::new(token)
    }

    fn account_mut(&mut self, credential: &Credential) -> Result<&mut Account, ProfileError> {
        let id = *self
            .tokens
            .get(credential.bearer())
            .ok_or_else(|| ProfileError::auth(Some("Unauthenticated.".into())))?;
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| ProfileError::auth(Some("Unauthenticated.".into())))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileService {
    store: Mutex<Store>,
}

impl InMemoryProfileService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service with one account and a few bookings, for demos.
    pub fn with_demo_account() -> Self {
        let svc = Self::new();
        let id = svc.insert_account("Demo User", "demo@example.com", "password123");
        svc.set_bookings(
            id,
            vec![
                BookingRecord {
                    id: Some("1001".into()),
                    category: Some("Cleaning".into()),
                    subcategory: Some("Deep clean".into()),
                    date: Some("2025-03-14".into()),
                    time: Some("10:00".into()),
                    status: BookingStatus::Confirmed,
                    price: Some("120".into()),
                },
                BookingRecord {
                    id: Some("1002".into()),
                    category: Some("Plumbing".into()),
                    subcategory: None,
                    date: Some("2025-04-02".into()),
                    time: None,
                    status: BookingStatus::Pending,
                    price: None,
                },
            ],
        );
        svc
    }

    /// Create an account directly, bypassing validation. Returns its id.
    pub fn insert_account(&self, name: &str, email: &str, password: &str) -> u64 {
        let mut store = self.store.lock();
        store.next_id += 1;
        let id = store.next_id;
        store.accounts.insert(
            id,
            Account {
                session: Session {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    profile_picture: None,
                },
                password: password.to_string(),
                bookings: Vec::new(),
            },
        );
        id
    }

    pub fn set_bookings(&self, id: u64, bookings: Vec<BookingRecord>) {
        if let Some(a) = self.store.lock().accounts.get_mut(&id) {
            a.bookings = bookings;
        }
    }

    /// Issue a token for an existing account, as a previous login would have.
    pub fn issue_token(&self, id: u64) -> Option<Credential> {
        let mut store = self.store.lock();
        store.accounts.contains_key(&id).then(|| store.issue(id))
    }

    pub fn active_tokens(&self) -> usize {
        self.store.lock().tokens.len()
    }
}

fn validate_password(
    errors: &mut Vec<FieldErrors>,
    password: &str,
    confirmation: &str,
) {
    let mut messages = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        messages.push(format!(
            "The password field must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    if password != confirmation {
        messages.push("The password field confirmation does not match.".to_string());
    }
    if !messages.is_empty() {
        errors.push(FieldErrors::new("password", messages));
    }
}

fn validate_identity(errors: &mut Vec<FieldErrors>, name: &str, email: &str) {
    if name.trim().is_empty() {
        errors.push(FieldErrors::new("name", ["The name field is required."]));
    }
    if !email.contains('@') {
        errors.push(FieldErrors::new(
            "email",
            ["The email field must be a valid email address."],
        ));
    }
}

#[async_trait]
impl AuthApi for InMemoryProfileService {
    async fn login(&self, email: &str, password: &str) -> Result<SignedIn, ProfileError> {
        let mut store = self.store.lock();
        let session = match store.by_email(email) {
            Some(a) if a.password == password => a.session.clone(),
            _ => return Err(ProfileError::auth(Some("Invalid credentials".into()))),
        };
        let credential = store.issue(session.id);
        debug!(user_id = session.id, "memory login");
        Ok(SignedIn {
            session,
            credential,
        })
    }

    async fn register(&self, registration: Registration) -> Result<SignedIn, ProfileError> {
        let mut store = self.store.lock();

        let mut errors = Vec::new();
        validate_identity(&mut errors, &registration.name, &registration.email);
        if store.by_email(&registration.email).is_some() {
            errors.push(FieldErrors::new(
                "email",
                ["The email has already been taken."],
            ));
        }
        validate_password(
            &mut errors,
            &registration.password,
            &registration.password_confirmation,
        );
        if !errors.is_empty() {
            return Err(ProfileError::validation(None, errors));
        }

        store.next_id += 1;
        let id = store.next_id;
        let session = Session {
            id,
            name: registration.name,
            email: registration.email,
            profile_picture: None,
        };
        store.accounts.insert(
            id,
            Account {
                session: session.clone(),
                password: registration.password,
                bookings: Vec::new(),
            },
        );
        let credential = store.issue(id);
        Ok(SignedIn {
            session,
            credential,
        })
    }

    async fn logout(&self, credential: &Credential) -> Result<(), ProfileError> {
        let mut store = self.store.lock();
        store
            .tokens
            .remove(credential.bearer())
            .map(|_| ())
            .ok_or_else(|| ProfileError::auth(Some("Unauthenticated.".into())))
    }

    async fn current_user(&self, credential: &Credential) -> Result<Session, ProfileError> {
        let mut store = self.store.lock();
        Ok(store.account_mut(credential)?.session.clone())
    }

    async fn update_profile(
        &self,
        credential: &Credential,
        update: ProfileUpdate,
    ) -> Result<Session, ProfileError> {
        let mut store = self.store.lock();
        let id = store.account_mut(credential)?.session.id;

        let mut errors = Vec::new();
        validate_identity(&mut errors, &update.name, &update.email);
        let taken = store
            .by_email(&update.email)
            .is_some_and(|other| other.session.id != id);
        if taken {
            errors.push(FieldErrors::new(
                "email",
                ["The email has already been taken."],
            ));
        }
        if let Some(p) = &update.picture {
            if !p.is_image() {
                errors.push(FieldErrors::new(
                    "profile_picture",
                    ["The profile picture field must be an image."],
                ));
            }
        }
        if !errors.is_empty() {
            return Err(ProfileError::validation(None, errors));
        }

        let account = store.account_mut(credential)?;
        account.session.name = update.name;
        account.session.email = update.email;
        if let Some(p) = update.picture {
            let ext = p.file_name.rsplit_once('.').map(|(_, e)| e).unwrap_or("img");
            account.session.profile_picture =
                Some(format!("profile_pictures/{}.{ext}", Uuid::new_v4().simple()));
        }
        Ok(account.session.clone())
    }
}

#[async_trait]
impl AccountApi for InMemoryProfileService {
    async fn update_password(
        &self,
        credential: &Credential,
        change: PasswordChange,
    ) -> Result<(), ProfileError> {
        let mut store = self.store.lock();
        let account = store.account_mut(credential)?;

        let mut errors = Vec::new();
        if account.password != change.current_password {
            errors.push(FieldErrors::new(
                "current_password",
                ["The current password is incorrect."],
            ));
        }
        validate_password(&mut errors, &change.password, &change.password_confirmation);
        if !errors.is_empty() {
            return Err(ProfileError::validation(None, errors));
        }

        account.password = change.password;
        Ok(())
    }

    async fn list_bookings(
        &self,
        credential: &Credential,
    ) -> Result<Vec<BookingRecord>, ProfileError> {
        let mut store = self.store.lock();
        Ok(store.account_mut(credential)?.bookings.clone())
    }
}
