use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a mezophase record, assigned by the record store.
/// Ids grow monotonically per store, so ordering by id is insertion order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MezoId(pub u64);

/// Identifier of an image inside a sample. Annotation records are keyed by it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl MezoId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl ImageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for MezoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mezo#{}", self.0)
    }
}

impl fmt::Display for MezoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mezo#{}", self.0)
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}
