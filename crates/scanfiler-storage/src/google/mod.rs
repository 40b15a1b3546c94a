//! Google Drive support
//!
//! ## Components
//!
//! - [`GoogleOAuth`] - OAuth2 client built from the downloaded credentials file
//! - [`SqliteTokenStore`] - Refresh tokens keyed by Google account e-mail
//! - [`ConsentServer`] - `/auth` and `/callback` endpoints filling the store
//! - [`GoogleDriveBackend`] - Uploads into per-category Drive folders

pub mod consent;
pub mod drive;
pub mod oauth;
pub mod token_store;

pub use consent::ConsentServer;
pub use drive::{DriveApi, GoogleDriveBackend};
pub use oauth::{AccessToken, GoogleOAuth, GrantedToken};
pub use token_store::{SqliteTokenStore, StoredToken};
