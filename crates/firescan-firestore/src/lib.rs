//! firescan-firestore - Firestore REST document store.
//!
//! Talks to the Firestore v1 REST API (or the local emulator) and decodes
//! its typed field values into plain JSON for display.

mod auth;
mod client;
mod endpoints;
mod store;
mod value;

pub use auth::{AccessToken, Credentials, TokenProvider};
pub use store::{DEFAULT_DATABASE, FirestoreStore, FirestoreStoreBuilder};
pub use value::FirestoreValue;
