//! Use cases (interactors) for scanfiler
//!
//! ## Use Cases
//!
//! - [`StorageDispatcher`] - Picks the tenant's storage backend and uploads a
//!   classified document

pub mod dispatch_storage;

pub use dispatch_storage::{DispatchError, StorageDispatcher};
