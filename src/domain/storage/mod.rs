//! Storage domain - the persistent store contract the cache fronts

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::Storage;
