//! Explicit session context shared by every view of one app instance.
//!
//! Created empty at bootstrap, filled on login/register/restore, refreshed
//! on profile updates and torn down on logout. Readers never block writers.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::contract::model::{Credential, Session, SignedIn};

#[derive(Clone, Default)]
pub struct SessionContext {
    current: Arc<ArcSwapOption<SignedIn>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that starts out signed in.
    pub fn with(signed_in: SignedIn) -> Self {
        let ctx = Self::new();
        ctx.establish(signed_in);
        ctx
    }

    pub fn establish(&self, signed_in: SignedIn) {
        self.current.store(Some(Arc::new(signed_in)));
    }

    pub fn current(&self) -> Option<Arc<SignedIn>> {
        self.current.load_full()
    }

    pub fn session(&self) -> Option<Session> {
        self.current.load().as_ref().map(|s| s.session.clone())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.current.load().as_ref().map(|s| s.credential.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.load().is_some()
    }

    /// Merge a profile update into the live session; the credential is kept.
    /// Returns the merged session, or `None` if nobody is signed in.
    pub fn merge_profile(&self, updated: Session) -> Option<Session> {
        let previous = self.current.rcu(|cur| {
            cur.as_ref().map(|s| {
                let mut session = s.session.clone();
                session.merge_update(updated.clone());
                Arc::new(SignedIn {
                    session,
                    credential: s.credential.clone(),
                })
            })
        });
        // `rcu` returns the value it replaced; read back what is stored now.
        previous.and_then(|_| self.session())
    }

    /// End the session, handing back what was stored.
    pub fn tear_down(&self) -> Option<Arc<SignedIn>> {
        self.current.swap(None)
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &self.session())
            .finish()
    }
}
