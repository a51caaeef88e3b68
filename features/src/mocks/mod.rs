//! In-memory provider implementations for tests and previews.
//!
//! These are deterministic doubles, not persistence layers: everything lives
//! in process memory and disappears with the value.

pub mod api;
pub mod repositories;
pub mod sinks;
pub mod storage;
pub mod user;

pub use api::MockApiClient;
pub use repositories::{InMemoryActivityRepository, InMemoryTaskRepository};
pub use sinks::{RecordingAnalytics, RecordingLogger};
pub use storage::InMemorySecureStorage;
pub use user::MockUserRepository;
