// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};

// === VIEW MODEL ===
pub mod config;
pub mod domain;

pub use config::{Endpoints, ProfileViewConfig};
pub use domain::view_model::{
    BookingFetch, PendingPreview, ProfileDeps, ProfileViewModel, ScreenSnapshot, SubmitOutcome,
};

// === ADAPTERS ===
// HTTP adapter for the real auth/profile service and an in-memory gateway
// used by the shell's --mock mode.
pub mod gateways;
pub mod infra;
