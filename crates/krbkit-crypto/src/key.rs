//! Key material lifecycle.
//!
//! `Keyblock` owns raw key bytes for one enctype and wipes them on drop.
//! `Key` is the shared handle the dispatch layer works with: it adds the
//! per-key derived-key cache, so deriving the same (key, constant) twice
//! costs one lookup instead of a KDF run. Cloning a `Key` bumps a shared
//! reference count; the cache and every sub-key it holds are torn down when
//! the last handle drops.

use std::fmt;
use std::sync::{Arc, Mutex};

use zeroize::Zeroize;

use crate::enctype::find_enctype;
use crate::error::{Error, Result};

/// Raw key bytes plus the enctype they belong to. Zeroized on drop.
#[derive(Clone)]
pub struct Keyblock {
    enctype: i32,
    bytes: Vec<u8>,
}

impl Keyblock {
    /// Wrap finished protocol key material, validating its length against
    /// the enctype's profile.
    pub fn new(enctype: i32, bytes: Vec<u8>) -> Result<Self> {
        let profile = find_enctype(enctype)?;
        if bytes.len() != profile.enc.keylength() {
            return Err(Error::BadKeySize);
        }
        Ok(Keyblock { enctype, bytes })
    }

    /// Wrap bytes without length validation. For intermediate derivation
    /// results whose length is dictated by the construction, not the
    /// enctype (e.g. an encrypt-then-MAC integrity key).
    pub(crate) fn raw(enctype: i32, bytes: Vec<u8>) -> Self {
        Keyblock { enctype, bytes }
    }

    pub fn enctype(&self) -> i32 {
        self.enctype
    }

    pub fn contents(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for Keyblock {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for Keyblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyblock")
            .field("enctype", &self.enctype)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

struct KeyInner {
    kb: Keyblock,
    /// Association list: derivation constant -> derived sub-key. Entries are
    /// only ever appended; the list dies with the parent key. Guarded so
    /// concurrent derivations on one key stay safe.
    cache: Mutex<Vec<(Vec<u8>, Key)>>,
}

/// A shared, reference-counted key handle with a derived-key cache.
#[derive(Clone)]
pub struct Key {
    inner: Arc<KeyInner>,
}

impl Key {
    pub fn new(kb: Keyblock) -> Key {
        Key {
            inner: Arc::new(KeyInner {
                kb,
                cache: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn keyblock(&self) -> &Keyblock {
        &self.inner.kb
    }

    pub fn enctype(&self) -> i32 {
        self.inner.kb.enctype()
    }

    pub fn contents(&self) -> &[u8] {
        self.inner.kb.contents()
    }

    /// Two handles to the same underlying key?
    pub fn same_key(&self, other: &Key) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Cache lookup by exact constant match; on miss, run `derive` and
    /// remember the result.
    pub(crate) fn cached_or_derive(
        &self,
        constant: &[u8],
        derive: impl FnOnce() -> Result<Keyblock>,
    ) -> Result<Key> {
        let mut cache = self
            .inner
            .cache
            .lock()
            .map_err(|_| Error::Internal("derived-key cache poisoned"))?;
        if let Some((_, key)) = cache.iter().find(|(c, _)| c == constant) {
            tracing::trace!(enctype = self.enctype(), "derived-key cache hit");
            return Ok(key.clone());
        }
        let key = Key::new(derive()?);
        cache.push((constant.to_vec(), key.clone()));
        tracing::trace!(
            enctype = self.enctype(),
            entries = cache.len(),
            "derived-key cache insert"
        );
        Ok(key)
    }

    #[cfg(test)]
    pub(crate) fn cache_len(&self) -> usize {
        self.inner.cache.lock().unwrap().len()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("enctype", &self.enctype())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
