//! Freezable binary values.
//!
//! A `Binary` is a byte buffer that can grow until it is frozen. Frozen
//! binaries share their buffer freely across clones and threads.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHasher;
use std::hash::Hasher;

use crate::error::{self, Result};

struct BinaryData {
    bytes: Vec<u8>,
    frozen: bool,
}

/// A shared byte-sequence value.
#[derive(Clone)]
pub struct Binary(Arc<RwLock<BinaryData>>);

impl Binary {
    /// A new binary holding a copy of `bytes`.
    pub fn new(bytes: &[u8], frozen: bool) -> Self {
        Binary(Arc::new(RwLock::new(BinaryData {
            bytes: bytes.to_vec(),
            frozen,
        })))
    }

    /// Takes ownership of `bytes` without copying.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Binary(Arc::new(RwLock::new(BinaryData {
            bytes,
            frozen: false,
        })))
    }

    pub fn len(&self) -> usize {
        self.0.read().bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().bytes.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    /// A copy of the contents.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.read().bytes.clone()
    }

    /// Appends a single byte.
    pub fn push(&self, byte: u8) -> Result<()> {
        let mut data = self.0.write();
        if data.frozen {
            return Err(error::frozen("Binary", "push"));
        }
        data.bytes.push(byte);
        Ok(())
    }

    /// Appends all of `bytes`.
    pub fn extend(&self, bytes: &[u8]) -> Result<()> {
        let mut data = self.0.write();
        if data.frozen {
            return Err(error::frozen("Binary", "extend"));
        }
        data.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Marks this binary immutable. One-way.
    pub fn freeze(&self) {
        self.0.write().frozen = true;
    }

    /// A frozen binary with the same contents. Returns the receiver when
    /// it is already frozen.
    pub fn frozen_copy(&self) -> Binary {
        let data = self.0.read();
        if data.frozen {
            return self.clone();
        }
        Binary(Arc::new(RwLock::new(BinaryData {
            bytes: data.bytes.clone(),
            frozen: true,
        })))
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn hash_code(&self) -> u64 {
        let mut h = FxHasher::default();
        h.write(&self.0.read().bytes);
        h.finish()
    }
}

impl PartialEq for Binary {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.read().bytes == other.0.read().bytes
    }
}

impl Eq for Binary {}

impl PartialOrd for Binary {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Binary {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return std::cmp::Ordering::Equal;
        }
        self.0.read().bytes.cmp(&other.0.read().bytes)
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0.read().bytes {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binary({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn push_then_freeze_rejects_mutation() {
        let b = Binary::new(b"ab", false);
        b.push(b'c').unwrap();
        b.freeze();
        let err = b.push(b'd').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FrozenMutation);
        assert_eq!(b.to_vec(), b"abc");
    }

    #[test]
    fn frozen_copy_is_isolated() {
        let b = Binary::new(b"ab", false);
        let frozen = b.frozen_copy();
        b.push(b'c').unwrap();
        assert_eq!(frozen.to_vec(), b"ab");
        assert!(frozen.is_frozen());
    }

    #[test]
    fn displays_as_hex() {
        let b = Binary::new(&[0xde, 0xad], true);
        assert_eq!(b.to_string(), "dead");
    }
}
