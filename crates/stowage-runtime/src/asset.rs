//! Loaded asset values

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An object extracted from a bundle
///
/// The value is type-erased; backends decide what they produce. The bundled
/// archive and directory backends produce raw bytes (`Vec<u8>`).
#[derive(Clone)]
pub struct Asset {
    name: String,
    type_tag: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl Asset {
    /// Wrap any value
    pub fn new<T: Any + Send + Sync>(name: &str, type_tag: &str, value: T) -> Self {
        Self {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            value: Arc::new(value),
        }
    }

    /// Wrap raw bytes
    pub fn from_bytes(name: &str, type_tag: &str, bytes: Vec<u8>) -> Self {
        Self::new(name, type_tag, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Get the value as `T`, if that is what it holds
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Get the value as bytes, if it holds a `Vec<u8>`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.value.downcast_ref::<Vec<u8>>().map(Vec::as_slice)
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Asset {
    /// Assets are equal when they share a name, a type and the same value
    /// allocation.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_tag == other.type_tag
            && Arc::ptr_eq(&self.value, &other.value)
    }
}
