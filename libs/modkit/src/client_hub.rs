//! Type-safe registry of clients keyed by interface type.
//!
//! Providers register an implementation once; consumers fetch it by the
//! trait object type: `hub.get::<dyn my::Api>()`. Re-registering replaces
//! the entry; `Arc`s already handed out stay valid. Tests register fakes
//! under the same trait type.

use parking_lot::RwLock;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not registered: {type_name}")]
    NotFound { type_name: &'static str },
}

struct Entry {
    type_name: &'static str,
    // always an `Arc<T>` for the `T` the key was built from
    client: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<TypeId, Entry>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under the interface type `T` (e.g. `dyn AuthApi`).
    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entry = Entry {
            type_name: std::any::type_name::<T>(),
            client: Box::new(client),
        };
        self.map.write().insert(TypeId::of::<T>(), entry);
    }

    /// Fetch the client registered under `T`.
    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|e| e.client.downcast_ref::<Arc<T>>())
            .cloned()
            .ok_or(ClientHubError::NotFound {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Names of every registered interface, for diagnostics.
    pub fn registered(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.map.read().values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}
