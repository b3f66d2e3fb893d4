//! Core FireScan types.
//!
//! These types enforce naming rules at construction time, so a store never
//! sees a path it would have to reject.

mod collection_path;

pub use collection_path::CollectionPath;
