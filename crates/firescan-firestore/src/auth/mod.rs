//! Access tokens for the Firestore REST API.
//!
//! Supports service account keys, gcloud user credentials and the GCE
//! metadata server. The emulator is reached without any token.

mod credentials;
mod provider;
mod tokens;

pub use credentials::{AuthorizedUser, Credentials, ServiceAccountKey};
pub use provider::TokenProvider;
pub use tokens::AccessToken;

pub(crate) use provider::METADATA_HOST;
