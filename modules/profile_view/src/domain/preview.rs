//! Local preview references for picked files.
//!
//! A [`PreviewHandle`] is the only owner of its reference: dropping it
//! revokes the reference, so replacing or clearing a pending upload can
//! not leak one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::contract::model::SelectedFile;

const SCHEME: &str = "blob:profile-view/";

#[derive(Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashMap<Uuid, SelectedFile>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and hand out a revocable reference to it.
    pub fn create(&self, file: &SelectedFile) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live.lock().insert(id, file.clone());
        PreviewHandle {
            id,
            uri: format!("{SCHEME}{id}"),
            live: self.live.clone(),
        }
    }

    /// Look up the file behind a reference that has not been revoked.
    pub fn resolve(&self, uri: &str) -> Option<SelectedFile> {
        let id = uri.strip_prefix(SCHEME)?.parse::<Uuid>().ok()?;
        self.live.lock().get(&id).cloned()
    }

    /// Number of references currently alive.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

pub struct PreviewHandle {
    id: Uuid,
    uri: String,
    live: Arc<Mutex<HashMap<Uuid, SelectedFile>>>,
}

impl PreviewHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.live.lock().remove(&self.id);
        tracing::trace!(uri = %self.uri, "preview revoked");
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.uri).finish()
    }
}

/// A picked file waiting for "Save Changes".
#[derive(Debug)]
pub struct PendingUpload {
    pub file: SelectedFile,
    pub preview: PreviewHandle,
}
