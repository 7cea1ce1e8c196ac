//! # ModKit - shared client plumbing
//!
//! - [`TracedClient`]: reqwest wrapper that opens an `outgoing_http` span per
//!   request and injects a W3C `traceparent` header.
//! - [`ClientHub`]: typed registry that wires port implementations
//!   (`dyn SomeApi`) to their consumers.

pub mod client_hub;
pub mod http;

pub use client_hub::{ClientHub, ClientHubError};
pub use http::client::TracedClient;
