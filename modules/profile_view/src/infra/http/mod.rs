//! HTTP adapter for the external auth/profile service.

pub mod client;
pub mod dto;
pub mod mapper;

pub use client::HttpProfileClient;
