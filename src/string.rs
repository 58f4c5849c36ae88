//! Shared immutable strings with a cached structural hash.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHasher;

struct StrInner {
    text: Box<str>,
    hash: OnceLock<u64>,
}

/// An immutable, cheaply clonable string value.
///
/// The structural hash is computed on first use and cached; strings are
/// the dominant map-key kind, so the cache pays for itself on the first
/// rehash.
#[derive(Clone)]
pub struct Str(Arc<StrInner>);

impl Str {
    /// The string contents.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0.text
    }

    /// The cached structural hash of the contents.
    pub fn hash_code(&self) -> u64 {
        *self.0.hash.get_or_init(|| {
            let mut h = FxHasher::default();
            h.write(self.0.text.as_bytes());
            h.finish()
        })
    }
}

impl From<&str> for Str {
    fn from(text: &str) -> Self {
        Str(Arc::new(StrInner {
            text: text.into(),
            hash: OnceLock::new(),
        }))
    }
}

impl From<String> for Str {
    fn from(text: String) -> Self {
        Str(Arc::new(StrInner {
            text: text.into_boxed_str(),
            hash: OnceLock::new(),
        }))
    }
}

impl Deref for Str {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Str {
    #[inline]
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.as_str() == other.as_str()
    }
}

impl Eq for Str {}

impl PartialEq<str> for Str {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

// Forwarding to `str` keeps `Borrow<str>`-keyed lookups working; the
// cached `hash_code` is reserved for the structural deep hash.
impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_share_hash() {
        let a = Str::from("hello");
        let b = Str::from(String::from("hello"));
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn hash_is_cached() {
        let a = Str::from("once");
        let first = a.hash_code();
        assert_eq!(first, a.hash_code());
    }

    #[test]
    fn deref_exposes_str_api() {
        let a = Str::from("hello");
        assert_eq!(a.len(), 5);
        assert!(a.starts_with("he"));
    }
}
