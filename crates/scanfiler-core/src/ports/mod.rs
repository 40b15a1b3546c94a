//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! ingestion pipeline. The watch loop depends on these traits only; the
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteListing`] - Lists a remote directory
//! - [`IFileTransfer`] - Downloads a remote file to local scratch space
//! - [`ITextExtractor`] - OCR: local file to plain text
//! - [`IClassifier`] - Text to structured [`Classification`](crate::domain::Classification)
//! - [`INotifier`] - Status messages to a tenant
//! - [`IStorageBackend`] - Stores a classified document with one provider

pub mod classifier;
pub mod extractor;
pub mod notifier;
pub mod remote;
pub mod storage;

pub use classifier::IClassifier;
pub use extractor::ITextExtractor;
pub use notifier::INotifier;
pub use remote::{IFileTransfer, IRemoteListing};
pub use storage::{IStorageBackend, StoredFile};
