//! The profile screen's view-model.
//!
//! Owns every piece of client-visible state and mediates each transition
//! caused by user input or a network response. State sits behind a sync
//! mutex that is never held across an `.await`; submissions are gated by
//! `is_submitting`, the booking fetch runs as its own task.

use std::sync::Arc;

use modkit::{ClientHub, ClientHubError};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Instrument};

use crate::contract::client::{AccountApi, AuthApi};
use crate::contract::error::ProfileError;
use crate::contract::model::{
    BookingRecord, Credential, ProfileUpdate, SelectedFile, Session, SignedIn,
};
use crate::domain::avatar::AvatarResolver;
use crate::domain::forms::{AuthForm, PasswordForm, ProfileForm};
use crate::domain::preview::{PendingUpload, PreviewRegistry};
use crate::domain::session::SessionContext;
use crate::domain::state::{Activation, AuthMode, Banner, ScreenState, Tab, View};

pub const WELCOME_BACK: &str = "Welcome back!";
pub const ACCOUNT_CREATED: &str = "Account created successfully!";
pub const PROFILE_UPDATED: &str = "Profile updated successfully!";
pub const PASSWORD_UPDATED: &str = "Password updated successfully!";

/// Collaborators of the view-model.
#[derive(Clone)]
pub struct ProfileDeps {
    pub auth: Arc<dyn AuthApi>,
    pub account: Arc<dyn AccountApi>,
    pub previews: PreviewRegistry,
    pub avatars: AvatarResolver,
}

impl ProfileDeps {
    /// Pick the port implementations registered in a [`ClientHub`].
    pub fn from_hub(
        hub: &ClientHub,
        previews: PreviewRegistry,
        avatars: AvatarResolver,
    ) -> Result<Self, ClientHubError> {
        Ok(Self {
            auth: hub.get::<dyn AuthApi>()?,
            account: hub.get::<dyn AccountApi>()?,
            previews,
            avatars,
        })
    }
}

/// Result of a submit action. The banner carries the user-facing text.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed,
    /// Another submission is in flight; nothing was done.
    Busy,
    /// The action does not apply to the current view.
    Ignored,
}

/// Handle to a running booking fetch.
#[derive(Debug)]
pub struct BookingFetch {
    handle: JoinHandle<()>,
}

impl BookingFetch {
    /// Wait until the fetch has finished (applied, dropped as stale, or cancelled).
    pub async fn settled(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "booking fetch task did not complete");
        }
    }
}

/// Pending upload as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPreview {
    pub file_name: String,
    pub preview_uri: String,
}

/// Render-ready copy of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    pub view: View,
    pub is_submitting: bool,
    pub banner: Option<Banner>,
    pub session: Option<Session>,
    pub avatar_url: Option<String>,
    pub auth_form: AuthForm,
    pub profile_form: ProfileForm,
    pub password_form: PasswordForm,
    pub pending_upload: Option<PendingPreview>,
    pub bookings_loading: bool,
    pub bookings: Vec<BookingRecord>,
}

struct Inner {
    deps: ProfileDeps,
    session: SessionContext,
    state: Mutex<ScreenState>,
    mounted: CancellationToken,
}

/// Clears `is_submitting` on every exit path, including a dropped future.
/// A guard orphaned by logout leaves a newer submission's flag alone.
struct SubmitGuard {
    inner: Arc<Inner>,
    ticket: u64,
    epoch: u64,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.inner.state.lock().end_submit(self.ticket);
    }
}

#[derive(Clone)]
pub struct ProfileViewModel {
    inner: Arc<Inner>,
}

impl ProfileViewModel {
    /// Mount the screen over an existing session context.
    pub fn mount(deps: ProfileDeps, session: SessionContext) -> Self {
        let mut state = ScreenState::default();
        if let Some(current) = session.session() {
            state.view = View::signed_in();
            state.profile_form = ProfileForm::seeded(&current);
        }
        Self {
            inner: Arc::new(Inner {
                deps,
                session,
                state: Mutex::new(state),
                mounted: CancellationToken::new(),
            }),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.mounted.is_cancelled()
    }

    /// Tear the view down: later async completions leave the screen alone,
    /// an in-flight booking fetch is abandoned and the pending preview is released.
    pub fn unmount(&self) {
        self.inner.mounted.cancel();
        self.inner.state.lock().pending_upload = None;
        debug!("profile view unmounted");
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        let session = self.inner.session.session();
        let st = self.inner.state.lock();
        let preview = st.pending_upload.as_ref().map(|p| p.preview.uri());
        let avatar_url = session.as_ref().map(|s| {
            self.inner
                .deps
                .avatars
                .resolve(&s.name, s.profile_picture.as_deref(), preview)
        });
        ScreenSnapshot {
            view: st.view,
            is_submitting: st.is_submitting,
            banner: st.banner.clone(),
            session,
            avatar_url,
            auth_form: st.auth_form.clone(),
            profile_form: st.profile_form.clone(),
            password_form: st.password_form.clone(),
            pending_upload: st.pending_upload.as_ref().map(|p| PendingPreview {
                file_name: p.file.file_name.clone(),
                preview_uri: p.preview.uri().to_string(),
            }),
            bookings_loading: st.bookings.loading,
            bookings: st.bookings.items.clone(),
        }
    }

    // --- input ---

    pub fn edit_auth(&self, edit: impl FnOnce(&mut AuthForm)) {
        edit(&mut self.inner.state.lock().auth_form);
    }

    pub fn edit_profile(&self, edit: impl FnOnce(&mut ProfileForm)) {
        edit(&mut self.inner.state.lock().profile_form);
    }

    pub fn edit_password(&self, edit: impl FnOnce(&mut PasswordForm)) {
        edit(&mut self.inner.state.lock().password_form);
    }

    pub fn dismiss_banner(&self) {
        self.inner.state.lock().banner = None;
    }

    /// Login ⇄ Register. Name and email survive the switch, passwords do not.
    pub fn toggle_auth_mode(&self) {
        let mut st = self.inner.state.lock();
        if st.view.toggle_mode() {
            st.auth_form.clear_passwords();
        }
    }

    /// Replace the pending upload; the previous preview is revoked.
    #[instrument(name = "profile_view.vm.select_file", skip_all, fields(file = %file.file_name))]
    pub fn select_file(&self, file: SelectedFile) -> Result<(), ProfileError> {
        let mut st = self.inner.state.lock();
        if !st.view.is_signed_in() {
            return Err(ProfileError::Unauthenticated);
        }
        if !file.is_image() {
            let err = ProfileError::UnsupportedFile {
                content_type: file.content_type.clone(),
            };
            st.banner = Some(Banner::Error(err.banner_message()));
            return Err(err);
        }
        let preview = self.inner.deps.previews.create(&file);
        debug!(uri = preview.uri(), "preview created");
        st.pending_upload = Some(PendingUpload { file, preview });
        Ok(())
    }

    /// Drop the pending upload and revoke its preview.
    pub fn cancel_upload(&self) {
        self.inner.state.lock().pending_upload = None;
    }

    // --- submissions ---

    /// Log in or register, depending on the signed-out mode.
    #[instrument(name = "profile_view.vm.submit_auth", skip(self))]
    pub async fn submit_auth(&self) -> SubmitOutcome {
        let (guard, mode, form) = {
            let mut st = self.inner.state.lock();
            let Some(mode) = st.view.auth_mode() else {
                return SubmitOutcome::Ignored;
            };
            let Some(guard) = self.start_submit(&mut st) else {
                return SubmitOutcome::Busy;
            };
            (guard, mode, st.auth_form.clone())
        };

        let result = match mode {
            AuthMode::Login => self.inner.deps.auth.login(&form.email, &form.password).await,
            AuthMode::Register => self.inner.deps.auth.register(form.registration()).await,
        };

        match result {
            Ok(signed_in) => {
                info!(user_id = signed_in.session.id, ?mode, "signed in");
                let message = match mode {
                    AuthMode::Login => WELCOME_BACK,
                    AuthMode::Register => ACCOUNT_CREATED,
                };
                self.enter_session(guard.epoch, signed_in, Some(message));
                SubmitOutcome::Succeeded
            }
            Err(e) => self.fail("auth", guard.epoch, e),
        }
    }

    /// Re-establish a session from a previously issued token.
    #[instrument(name = "profile_view.vm.restore", skip_all)]
    pub async fn restore(&self, credential: Credential) -> SubmitOutcome {
        let guard = {
            let mut st = self.inner.state.lock();
            if st.view.is_signed_in() {
                return SubmitOutcome::Ignored;
            }
            let Some(guard) = self.start_submit(&mut st) else {
                return SubmitOutcome::Busy;
            };
            guard
        };

        match self.inner.deps.auth.current_user(&credential).await {
            Ok(session) => {
                info!(user_id = session.id, "session restored");
                self.enter_session(guard.epoch, SignedIn { session, credential }, None);
                SubmitOutcome::Succeeded
            }
            Err(e) => self.fail("restore", guard.epoch, e),
        }
    }

    /// Send name, email and the pending picture (if any).
    #[instrument(name = "profile_view.vm.submit_profile_update", skip(self))]
    pub async fn submit_profile_update(&self) -> SubmitOutcome {
        let (guard, update, submitted_preview) = {
            let mut st = self.inner.state.lock();
            if !st.view.is_signed_in() {
                return SubmitOutcome::Ignored;
            }
            let Some(guard) = self.start_submit(&mut st) else {
                return SubmitOutcome::Busy;
            };
            let update = ProfileUpdate {
                name: st.profile_form.name.clone(),
                email: st.profile_form.email.clone(),
                picture: st.pending_upload.as_ref().map(|p| p.file.clone()),
            };
            let uri = st
                .pending_upload
                .as_ref()
                .map(|p| p.preview.uri().to_string());
            (guard, update, uri)
        };

        let Some(credential) = self.inner.session.credential() else {
            return self.fail("profile", guard.epoch, ProfileError::Unauthenticated);
        };

        match self.inner.deps.auth.update_profile(&credential, update).await {
            Ok(updated) => {
                let current = self.in_epoch(guard.epoch, |st| {
                    let merged = self.inner.session.merge_profile(updated);
                    if !self.is_mounted() {
                        return;
                    }
                    if let Some(s) = &merged {
                        st.profile_form = ProfileForm::seeded(s);
                    }
                    // a file picked while the request was in flight stays pending
                    let same_upload = st.pending_upload.as_ref().map(|p| p.preview.uri())
                        == submitted_preview.as_deref();
                    if same_upload {
                        st.pending_upload = None;
                    }
                    st.banner = Some(Banner::Success(PROFILE_UPDATED.to_string()));
                });
                match current {
                    Some(()) => info!("profile updated"),
                    None => debug!("profile updated after sign-out; result dropped"),
                }
                SubmitOutcome::Succeeded
            }
            Err(e) => self.fail("profile", guard.epoch, e),
        }
    }

    /// Change the password; mismatched new passwords never reach the server.
    #[instrument(name = "profile_view.vm.submit_password_update", skip(self))]
    pub async fn submit_password_update(&self) -> SubmitOutcome {
        let (guard, change) = {
            let mut st = self.inner.state.lock();
            if !st.view.is_signed_in() {
                return SubmitOutcome::Ignored;
            }
            if st.is_submitting {
                return SubmitOutcome::Busy;
            }
            if !st.password_form.passwords_match() {
                st.banner = Some(Banner::Error(ProfileError::PasswordMismatch.banner_message()));
                return SubmitOutcome::Failed;
            }
            let Some(guard) = self.start_submit(&mut st) else {
                return SubmitOutcome::Busy;
            };
            (guard, st.password_form.change())
        };

        let Some(credential) = self.inner.session.credential() else {
            return self.fail("password", guard.epoch, ProfileError::Unauthenticated);
        };

        match self
            .inner
            .deps
            .account
            .update_password(&credential, change)
            .await
        {
            Ok(()) => {
                let current = self.apply_in_epoch(guard.epoch, |st| {
                    st.password_form = PasswordForm::default();
                    st.banner = Some(Banner::Success(PASSWORD_UPDATED.to_string()));
                });
                match current {
                    Some(()) => info!("password updated"),
                    None => debug!("password updated after sign-out; result dropped"),
                }
                SubmitOutcome::Succeeded
            }
            Err(e) => self.fail("password", guard.epoch, e),
        }
    }

    /// Sign out locally, then tell the server. A server failure is only logged.
    /// Submissions still in flight are orphaned: their results are dropped.
    #[instrument(name = "profile_view.vm.logout", skip(self))]
    pub async fn logout(&self) {
        let Some(ended) = self.inner.session.tear_down() else {
            return;
        };
        {
            let mut st = self.inner.state.lock();
            if self.is_mounted() {
                st.reset_signed_out();
            } else {
                st.end_session();
            }
        }
        info!(user_id = ended.session.id, "signed out");

        if let Err(e) = self.inner.deps.auth.logout(&ended.credential).await {
            warn!(error = %e, "server-side logout failed");
        }
    }

    // --- tabs ---

    /// Switch tabs. Entering Bookings starts exactly one fetch; re-selecting
    /// the active tab does nothing.
    #[instrument(name = "profile_view.vm.activate_tab", skip(self))]
    pub fn activate_tab(&self, tab: Tab) -> Option<BookingFetch> {
        let (generation, credential) = {
            let mut st = self.inner.state.lock();
            match st.view.activate(tab) {
                Activation::Switched {
                    fetch_bookings: true,
                } => {}
                _ => return None,
            }
            let credential = self.inner.session.credential()?;
            (st.bookings.begin_fetch(), credential)
        };

        let vm = self.clone();
        let span = tracing::info_span!("profile_view.vm.load_bookings", generation);
        let handle = tokio::spawn(
            async move { vm.load_bookings(generation, credential).await }.instrument(span),
        );
        Some(BookingFetch { handle })
    }

    async fn load_bookings(&self, generation: u64, credential: Credential) {
        let result = tokio::select! {
            _ = self.inner.mounted.cancelled() => {
                debug!("view torn down; booking fetch abandoned");
                return;
            }
            r = self.inner.deps.account.list_bookings(&credential) => r,
        };

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                // the list degrades to empty instead of raising a banner
                warn!(error = %e, "booking fetch failed");
                Vec::new()
            }
        };

        let count = items.len();
        let applied = self.apply(|st| st.bookings.finish_fetch(generation, items));
        match applied {
            Some(true) => debug!(count, "bookings loaded"),
            _ => debug!("stale booking fetch dropped"),
        }
    }

    // --- helpers ---

    fn start_submit(&self, st: &mut ScreenState) -> Option<SubmitGuard> {
        let ticket = st.begin_submit()?;
        Some(SubmitGuard {
            inner: self.inner.clone(),
            ticket,
            epoch: st.epoch,
        })
    }

    /// Mutate screen state unless the view has been torn down.
    fn apply<R>(&self, f: impl FnOnce(&mut ScreenState) -> R) -> Option<R> {
        if self.inner.mounted.is_cancelled() {
            return None;
        }
        Some(f(&mut self.inner.state.lock()))
    }

    /// Run `f` under the state lock if no sign-in or sign-out happened since `epoch`.
    fn in_epoch<R>(&self, epoch: u64, f: impl FnOnce(&mut ScreenState) -> R) -> Option<R> {
        let mut st = self.inner.state.lock();
        if st.epoch != epoch {
            return None;
        }
        Some(f(&mut st))
    }

    fn apply_in_epoch<R>(&self, epoch: u64, f: impl FnOnce(&mut ScreenState) -> R) -> Option<R> {
        if self.inner.mounted.is_cancelled() {
            return None;
        }
        self.in_epoch(epoch, f)
    }

    fn enter_session(&self, epoch: u64, signed_in: SignedIn, message: Option<&str>) {
        let profile_form = ProfileForm::seeded(&signed_in.session);
        let entered = self.in_epoch(epoch, |st| {
            self.inner.session.establish(signed_in);
            st.epoch += 1;
            if !self.is_mounted() {
                return;
            }
            st.view = View::signed_in();
            st.auth_form = AuthForm::default();
            st.profile_form = profile_form;
            st.password_form = PasswordForm::default();
            st.bookings.reset();
            st.banner = message.map(|m| Banner::Success(m.to_string()));
        });
        if entered.is_none() {
            debug!("sign-in superseded; session not established");
        }
    }

    fn fail(&self, operation: &'static str, epoch: u64, error: ProfileError) -> SubmitOutcome {
        warn!(operation, error = %error, "submission failed");
        let text = error.banner_message();
        self.apply_in_epoch(epoch, |st| st.banner = Some(Banner::Error(text)));
        SubmitOutcome::Failed
    }
}

impl std::fmt::Debug for ProfileViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileViewModel")
            .field("mounted", &self.is_mounted())
            .field("view", &self.inner.state.lock().view)
            .finish()
    }
}
