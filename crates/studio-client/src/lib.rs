//! HTTP client for the studio content backend
//!
//! Wraps the REST API with a base URL, a request timeout and bearer-token
//! attachment, and exposes one CRUD group per content type plus the admin
//! account and upload endpoints.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod auth;
pub mod resources;
pub mod session;
pub mod upload;

pub use api_client::ApiClient;
pub use resources::{CrudApi, ResourceApi};
pub use session::{FileStorage, MemoryStorage, Session, SessionStorage};
