//! Core traits for document store behavior.

mod store;

pub use store::DocumentStore;
