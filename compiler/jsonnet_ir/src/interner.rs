//! String interner for identifiers and field names.
//!
//! Append-only: interned strings are leaked so `lookup` can hand out
//! `&'static str` without holding the lock. A program interns a bounded set
//! of identifiers, so the leak is equivalent to an arena that lives for the
//! process lifetime.

// Rc is disallowed here on purpose: the interner is shared between the host
// and the evaluator, which may live on different threads.
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

struct InternerInner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Append-only string table mapping strings to [`Name`] handles.
pub struct StringInterner {
    inner: RwLock<InternerInner>,
}

impl StringInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        StringInterner {
            inner: RwLock::new(InternerInner {
                map: FxHashMap::default(),
                strings: Vec::with_capacity(64),
            }),
        }
    }

    /// Intern a string, returning its handle.
    ///
    /// Interning the same string twice returns the same `Name`.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.inner.read();
            if let Some(&raw) = guard.map.get(s) {
                return Name::from_raw(raw);
            }
        }

        let mut guard = self.inner.write();
        // Double-check after acquiring the write lock.
        if let Some(&raw) = guard.map.get(s) {
            return Name::from_raw(raw);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let raw = u32::try_from(guard.strings.len()).expect("interner overflow");
        guard.strings.push(leaked);
        guard.map.insert(leaked, raw);
        Name::from_raw(raw)
    }

    /// Resolve a handle back to its string.
    ///
    /// # Panics
    ///
    /// Panics if `name` was produced by a different interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner.read().strings[name.as_u32() as usize]
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Whether no strings have been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`StringInterner`].
///
/// The host, the AST producer, and the evaluator must all use the same
/// interner; this is the handle they pass around.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for SharedInterner {
    type Target = StringInterner;

    #[inline]
    fn deref(&self) -> &StringInterner {
        &self.0
    }
}
