//! Content management console for the studio website backend
//!
//! This crate holds the page state behind the admin console: per-collection
//! stores with create/edit forms and delete confirmation, the gallery
//! featured rule, ordered social links, booking and contact workflows, the
//! dashboard aggregation, image fields with local preview, and the
//! background pollers that keep lists fresh. All network access goes
//! through `studio-client`.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod dashboard;
pub mod dialog;
pub mod error;
pub mod events;
pub mod gallery;
pub mod image;
pub mod menu;
pub mod polling;
pub mod profile;
pub mod social;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use dashboard::{Dashboard, DashboardSnapshot, aggregate};
pub use dialog::{AutoConfirm, Confirm, ConfirmDialog, Dialog, ErrorDialog};
pub use error::{AdminError, AdminResult};
pub use events::{AdminEvent, EventBus};
pub use gallery::FeatureOutcome;
pub use image::{ImageField, ImageUploader};
pub use polling::{PollHandle, Poller, Trigger, Visibility};
pub use profile::ProfilePage;
pub use social::SocialLinks;
pub use store::{CollectionStore, EditBuffer, EditMode, PageStatus, RefreshPolicy};
