//! Remote function-call client for the Sitework backend
//!
//! Executes named remote calls (`mutation` or `query`) over HTTP with JSON
//! payloads and bearer-token auth. The client is schema-agnostic: request
//! arguments and response values are generic JSON.

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use client::{FunctionKind, RemoteClient, RemoteClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
