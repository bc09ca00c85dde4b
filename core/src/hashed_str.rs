//! Hashed string identifiers.
//!
//! A [`HashedStr`] pairs a 32-bit FNV-1a hash with the bytes it was computed
//! from. Equality and hashing only look at the numeric hash, so two strings
//! that collide are the *same key*. The text is kept for diagnostics.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over `bytes`, usable in constant expressions.
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A string key identified by its hash.
///
/// ```
/// use squared_core::HashedStr;
///
/// const SHADER: HashedStr = HashedStr::new("DEFAULT_SHADER");
/// assert_eq!(SHADER, HashedStr::from(String::from("DEFAULT_SHADER")));
/// assert_eq!(SHADER.as_str(), "DEFAULT_SHADER");
/// ```
#[derive(Clone)]
pub struct HashedStr {
    hash: u32,
    text: Cow<'static, str>,
}

impl HashedStr {
    /// Hashes a static string at compile time.
    pub const fn new(text: &'static str) -> Self {
        Self {
            hash: fnv1a_32(text.as_bytes()),
            text: Cow::Borrowed(text),
        }
    }

    /// Hashes an owned string at runtime.
    pub fn owned(text: String) -> Self {
        Self {
            hash: fnv1a_32(text.as_bytes()),
            text: Cow::Owned(text),
        }
    }

    /// The numeric key.
    pub fn value(&self) -> u32 {
        self.hash
    }

    /// The original text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for HashedStr {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for HashedStr {}

impl Hash for HashedStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for HashedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedStr({:?}, {:#010x})", self.text, self.hash)
    }
}

impl fmt::Display for HashedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&'static str> for HashedStr {
    fn from(text: &'static str) -> Self {
        Self::new(text)
    }
}

impl From<String> for HashedStr {
    fn from(text: String) -> Self {
        Self::owned(text)
    }
}

impl From<&String> for HashedStr {
    fn from(text: &String) -> Self {
        Self::owned(text.clone())
    }
}

impl From<&HashedStr> for HashedStr {
    fn from(id: &HashedStr) -> Self {
        id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hash_is_offset_basis() {
        assert_eq!(fnv1a_32(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn const_and_runtime_agree() {
        const ID: HashedStr = HashedStr::new("POINT_BUFFER_0");
        let runtime = HashedStr::owned(format!("POINT_BUFFER_{}", 0));
        assert_eq!(ID, runtime);
        assert_eq!(ID.value(), runtime.value());
    }

    #[test]
    fn distinct_strings_differ() {
        assert_ne!(HashedStr::new("alpha"), HashedStr::new("beta"));
    }

    #[test]
    fn known_collision_is_same_key() {
        let a = HashedStr::new("costarring");
        let b = HashedStr::new("liquid");
        assert_eq!(a.value(), b.value());
        assert_eq!(a, b);
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn display_shows_text() {
        let id = HashedStr::new("DEFAULT_RENDER_GRAPH");
        assert_eq!(id.to_string(), "DEFAULT_RENDER_GRAPH");
        assert!(format!("{id:?}").contains("DEFAULT_RENDER_GRAPH"));
    }
}
