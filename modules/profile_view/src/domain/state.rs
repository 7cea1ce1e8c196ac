//! Screen state as explicit tagged enums.
//!
//! The signed-out root toggles between login and registration; the
//! signed-in root moves freely between three tabs. Banners are an
//! `Option<Banner>`, so an error and a success can never show together.

use crate::contract::model::BookingRecord;
use crate::domain::forms::{AuthForm, PasswordForm, ProfileForm};
use crate::domain::preview::PendingUpload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    General,
    Security,
    Bookings,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "Personal Information",
            Self::Security => "Security & Password",
            Self::Bookings => "Bookings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    SignedOut { mode: AuthMode },
    SignedIn { tab: Tab },
}

impl Default for View {
    fn default() -> Self {
        Self::signed_out()
    }
}

/// What a tab activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Signed out: there are no tabs.
    Ignored,
    /// The tab was already active.
    Unchanged,
    /// The tab changed; `fetch_bookings` is set when Bookings was entered.
    Switched { fetch_bookings: bool },
}

impl View {
    pub fn signed_out() -> Self {
        Self::SignedOut {
            mode: AuthMode::Login,
        }
    }

    pub fn signed_in() -> Self {
        Self::SignedIn { tab: Tab::General }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn auth_mode(&self) -> Option<AuthMode> {
        match self {
            Self::SignedOut { mode } => Some(*mode),
            Self::SignedIn { .. } => None,
        }
    }

    pub fn active_tab(&self) -> Option<Tab> {
        match self {
            Self::SignedIn { tab } => Some(*tab),
            Self::SignedOut { .. } => None,
        }
    }

    /// Login ⇄ Register. Returns false when signed in.
    pub fn toggle_mode(&mut self) -> bool {
        match self {
            Self::SignedOut { mode } => {
                *mode = mode.toggled();
                true
            }
            Self::SignedIn { .. } => false,
        }
    }

    pub fn activate(&mut self, next: Tab) -> Activation {
        match self {
            Self::SignedOut { .. } => Activation::Ignored,
            Self::SignedIn { tab } if *tab == next => Activation::Unchanged,
            Self::SignedIn { tab } => {
                *tab = next;
                Activation::Switched {
                    fetch_bookings: next == Tab::Bookings,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Error(String),
    Success(String),
}

impl Banner {
    pub fn text(&self) -> &str {
        match self {
            Self::Error(t) | Self::Success(t) => t,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug, Default)]
pub struct BookingsState {
    pub loading: bool,
    pub items: Vec<BookingRecord>,
    /// Bumped on every fetch start and reset; only the latest fetch may apply.
    pub generation: u64,
}

impl BookingsState {
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    /// Apply a fetch result if it is still the latest one.
    pub fn finish_fetch(&mut self, generation: u64, items: Vec<BookingRecord>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.items = items;
        self.loading = false;
        true
    }

    /// Drop everything; in-flight fetches become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.loading = false;
        self.items.clear();
    }
}

#[derive(Debug, Default)]
pub struct ScreenState {
    pub view: View,
    pub is_submitting: bool,
    /// Identifies the submission that owns `is_submitting`.
    pub submit_ticket: u64,
    /// Bumped on every sign-in and sign-out; completions started under an
    /// older epoch are dropped.
    pub epoch: u64,
    pub banner: Option<Banner>,
    pub bookings: BookingsState,
    pub auth_form: AuthForm,
    pub profile_form: ProfileForm,
    pub password_form: PasswordForm,
    pub pending_upload: Option<PendingUpload>,
}

impl ScreenState {
    /// Claim `is_submitting`. Returns the ticket of the new submission,
    /// or `None` when one is already running.
    pub fn begin_submit(&mut self) -> Option<u64> {
        if self.is_submitting {
            return None;
        }
        self.is_submitting = true;
        self.submit_ticket += 1;
        self.banner = None;
        Some(self.submit_ticket)
    }

    /// Release `is_submitting` if `ticket` still owns it.
    pub fn end_submit(&mut self, ticket: u64) {
        if self.submit_ticket == ticket {
            self.is_submitting = false;
        }
    }

    /// Orphan whatever is in flight for the current session.
    pub fn end_session(&mut self) {
        self.epoch += 1;
        self.is_submitting = false;
    }

    /// Back to the signed-out login form. Pending previews are released.
    pub fn reset_signed_out(&mut self) {
        self.end_session();
        self.view = View::signed_out();
        self.banner = None;
        self.bookings.reset();
        self.auth_form = AuthForm::default();
        self.profile_form = ProfileForm::default();
        self.password_form = PasswordForm::default();
        self.pending_upload = None;
    }
}
