#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use url::Url;

use profile_view::client::{AccountApi, AuthApi};
use profile_view::domain::avatar::AvatarResolver;
use profile_view::domain::preview::PreviewRegistry;
use profile_view::domain::session::SessionContext;
use profile_view::error::ProfileError;
use profile_view::model::{
    BookingRecord, BookingStatus, Credential, PasswordChange, ProfileUpdate, Registration,
    Session, SignedIn,
};
use profile_view::{ProfileDeps, ProfileViewModel};

/// Holds a backend call until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct Calls {
    pub login: AtomicUsize,
    pub register: AtomicUsize,
    pub logout: AtomicUsize,
    pub current_user: AtomicUsize,
    pub update_profile: AtomicUsize,
    pub update_password: AtomicUsize,
    pub list_bookings: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Scriptable backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Calls,
    /// Returned by the next submission instead of success.
    fail_next: Mutex<Option<ProfileError>>,
    /// Taken by the next submission and awaited.
    submit_gate: Mutex<Option<Arc<Gate>>>,
    /// Taken by the next booking fetch and awaited.
    bookings_gate: Mutex<Option<Arc<Gate>>>,
    bookings: Mutex<VecDeque<Result<Vec<BookingRecord>, ProfileError>>>,
    last_update: Mutex<Option<ProfileUpdate>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, err: ProfileError) {
        *self.fail_next.lock() = Some(err);
    }

    pub fn gate_next_submit(&self) -> Arc<Gate> {
        let gate = Gate::new();
        *self.submit_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn gate_next_bookings(&self) -> Arc<Gate> {
        let gate = Gate::new();
        *self.bookings_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn push_bookings(&self, result: Result<Vec<BookingRecord>, ProfileError>) {
        self.bookings.lock().push_back(result);
    }

    pub fn last_update(&self) -> Option<ProfileUpdate> {
        self.last_update.lock().clone()
    }

    async fn submission(&self, counter: &AtomicUsize) -> Result<(), ProfileError> {
        counter.fetch_add(1, Ordering::SeqCst);
        let gate = self.submit_gate.lock().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn jane() -> Session {
    Session {
        id: 7,
        name: "Jane".into(),
        email: "jane@x.com".into(),
        profile_picture: None,
    }
}

pub fn booking(id: &str, status: BookingStatus) -> BookingRecord {
    BookingRecord {
        id: Some(id.into()),
        category: Some("Cleaning".into()),
        status,
        ..Default::default()
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<SignedIn, ProfileError> {
        self.submission(&self.calls.login).await?;
        Ok(SignedIn {
            session: Session {
                email: email.to_string(),
                ..jane()
            },
            credential: Credential::new("tok-login"),
        })
    }

    async fn register(&self, registration: Registration) -> Result<SignedIn, ProfileError> {
        self.submission(&self.calls.register).await?;
        Ok(SignedIn {
            session: Session {
                id: 8,
                name: registration.name,
                email: registration.email,
                profile_picture: None,
            },
            credential: Credential::new("tok-register"),
        })
    }

    async fn logout(&self, _credential: &Credential) -> Result<(), ProfileError> {
        self.submission(&self.calls.logout).await
    }

    async fn current_user(&self, _credential: &Credential) -> Result<Session, ProfileError> {
        self.submission(&self.calls.current_user).await?;
        Ok(jane())
    }

    async fn update_profile(
        &self,
        _credential: &Credential,
        update: ProfileUpdate,
    ) -> Result<Session, ProfileError> {
        *self.last_update.lock() = Some(update.clone());
        self.submission(&self.calls.update_profile).await?;
        Ok(Session {
            id: 7,
            name: update.name,
            email: update.email,
            profile_picture: update
                .picture
                .map(|p| format!("profile_pictures/{}", p.file_name)),
        })
    }
}

#[async_trait]
impl AccountApi for FakeBackend {
    async fn update_password(
        &self,
        _credential: &Credential,
        _change: PasswordChange,
    ) -> Result<(), ProfileError> {
        self.submission(&self.calls.update_password).await
    }

    async fn list_bookings(
        &self,
        _credential: &Credential,
    ) -> Result<Vec<BookingRecord>, ProfileError> {
        self.calls.list_bookings.fetch_add(1, Ordering::SeqCst);
        let scripted = self.bookings.lock().pop_front();
        let gate = self.bookings_gate.lock().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        scripted.unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub struct Harness {
    pub vm: ProfileViewModel,
    pub backend: Arc<FakeBackend>,
    pub previews: PreviewRegistry,
}

pub fn deps(backend: &Arc<FakeBackend>, previews: &PreviewRegistry) -> ProfileDeps {
    ProfileDeps {
        auth: backend.clone(),
        account: backend.clone(),
        previews: previews.clone(),
        avatars: AvatarResolver::new(
            Url::parse("http://127.0.0.1:8000/storage/").unwrap(),
            "https://ui-avatars.com/api/",
        ),
    }
}

/// Mounted with nobody signed in.
pub fn signed_out() -> Harness {
    mount_with(SessionContext::new())
}

/// Mounted over an existing session for Jane.
pub fn signed_in() -> Harness {
    mount_with(SessionContext::with(SignedIn {
        session: jane(),
        credential: Credential::new("tok-existing"),
    }))
}

fn mount_with(session: SessionContext) -> Harness {
    let backend = FakeBackend::new();
    let previews = PreviewRegistry::new();
    let vm = ProfileViewModel::mount(deps(&backend, &previews), session);
    Harness {
        vm,
        backend,
        previews,
    }
}
