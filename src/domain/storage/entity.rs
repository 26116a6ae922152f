//! Traits for records that can be kept in a [`Storage`](super::Storage) backend

use std::fmt::Debug;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};

/// A record key. Backends address rows by the string form of the key, so
/// two keys that compare equal must also render the same string.
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + Hash {
    fn as_str(&self) -> &str;
}

/// A record persisted as a whole snapshot under its key
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    type Key: StorageKey;

    fn key(&self) -> &Self::Key;
}
