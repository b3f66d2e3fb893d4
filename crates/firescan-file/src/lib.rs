//! firescan-file - Filesystem-backed document store.
//!
//! Each collection is a directory and each document a `<id>.json` file
//! holding a JSON object. Subcollections live under their parent
//! document's directory, mirroring the collection path.

mod store;

pub use store::FileStore;
