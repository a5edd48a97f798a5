//! Cheap, deduplicated handles for account paths and currency codes.
//!
//! A ledger re-mentions the same handful of account names and currency
//! codes on almost every line. [`InternedStr`] wraps an `Arc<str>` so
//! cloning a handle is a refcount bump rather than an allocation, and
//! [`StringInterner`] hands out one shared allocation per distinct string
//! so that equal names end up pointer-equal.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A deduplicated account name or currency code.
#[derive(Debug, Clone, Eq)]
pub struct InternedStr(Arc<str>);

impl InternedStr {
    /// Wrap `s` in a handle without consulting a [`StringInterner`].
    ///
    /// Two handles built this way from equal text are still `==`, just not
    /// pointer-equal. Go through [`StringInterner::intern`] instead when
    /// building a ledger so repeated names share an allocation.
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    /// The wrapped text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `self` and `other` share the same backing allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for InternedStr {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for InternedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for InternedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq for InternedStr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl PartialOrd for InternedStr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedStr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl std::hash::Hash for InternedStr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialEq<str> for InternedStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for InternedStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for InternedStr {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other.as_str()
    }
}

impl From<&str> for InternedStr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InternedStr {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for InternedStr {
    fn from(s: &String) -> Self {
        Self::new(s.as_str())
    }
}

impl From<&InternedStr> for InternedStr {
    fn from(s: &InternedStr) -> Self {
        s.clone()
    }
}

impl Default for InternedStr {
    fn default() -> Self {
        Self::new("")
    }
}

impl Serialize for InternedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InternedStr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Deduplicating pool of [`InternedStr`] handles, used while loading a
/// ledger so that every mention of an account or currency resolves to the
/// same allocation.
#[derive(Debug, Default)]
pub struct StringInterner {
    pool: HashSet<InternedStr>,
}

impl StringInterner {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `s` in the pool, inserting it first if this is the first
    /// time it's been seen. Accepts both borrowed and owned text so callers
    /// don't need to allocate just to probe the pool.
    pub fn intern<S>(&mut self, s: S) -> InternedStr
    where
        S: AsRef<str> + Into<Arc<str>>,
    {
        if let Some(existing) = self.pool.get(s.as_ref()) {
            return existing.clone();
        }
        let handle = InternedStr::new(s);
        self.pool.insert(handle.clone());
        handle
    }

    /// Intern an owned string. Kept as a distinct entry point for call
    /// sites that already have a `String` and want to avoid re-deriving
    /// the generic bound at the call site.
    pub fn intern_string(&mut self, s: String) -> InternedStr {
        self.intern(s)
    }

    /// Count of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_by_text_not_identity() {
        let a = InternedStr::new("Assets:Bank");
        let b = InternedStr::new("Assets:Bank");
        let c = InternedStr::new("Assets:Cash");

        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b), "built independently, should not share an allocation");
        assert_ne!(a, c);
        assert_eq!(a, "Assets:Bank");
        assert_eq!(a, "Assets:Bank".to_string());
    }

    #[test]
    fn pool_hands_out_one_allocation_per_name() {
        let mut pool = StringInterner::new();

        let first = pool.intern("Expenses:Food");
        let second = pool.intern("Expenses:Food");
        let third = pool.intern_string("Assets:Bank".to_string());

        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&third));
        assert_eq!(pool.len(), 2);
        assert!(!pool.is_empty());
    }

    #[test]
    fn handle_is_usable_as_a_hashmap_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(InternedStr::new("key"), 1);

        assert_eq!(map.get(&InternedStr::new("key")), Some(&1));
    }

    #[test]
    fn ordering_matches_the_underlying_text() {
        let mut names: Vec<InternedStr> =
            vec!["Liabilities", "Assets", "Income"].into_iter().map(InternedStr::new).collect();
        names.sort();

        assert_eq!(names, vec![InternedStr::new("Assets"), InternedStr::new("Income"), InternedStr::new("Liabilities")]);
    }
}
