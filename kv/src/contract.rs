//! The transactional key/value contract consumed by the metadata catalog.
//!
//! Unlike [`crate::storage::engine::Engine`], which is a raw byte-oriented
//! store meant for a single caller, `TxnKv` is `Send + Sync` and safe to
//! share across threads: every method takes `&self`, and implementors are
//! responsible for making the multi-key operations atomic.

use std::sync::Mutex;

use crate::error::{CResult, KvError};
use crate::storage::engine::Engine;
use crate::storage::memory::Memory;

/// Operations required of a reliable, transactional, prefix-indexed
/// key/value store. All `multi_*` operations commit all-or-nothing.
pub trait TxnKv: Send + Sync {
    fn load(&self, key: &str) -> CResult<String>;
    fn load_with_prefix(&self, prefix: &str) -> CResult<Vec<(String, String)>>;
    fn save(&self, key: &str, value: &str) -> CResult<()>;
    /// Removing an absent key is success.
    fn remove(&self, key: &str) -> CResult<()>;
    fn multi_save(&self, kvs: &[(String, String)]) -> CResult<()>;
    fn multi_remove(&self, keys: &[String]) -> CResult<()>;
    fn multi_save_and_remove(&self, saves: &[(String, String)], removes: &[String]) -> CResult<()>;
}

/// An in-memory `TxnKv` backed by [`Memory`], guarded by a single mutex.
///
/// Every method locks the whole engine for its duration, so a `multi_*`
/// call is trivially atomic: no other call can observe a partial write,
/// because no other call can run at all while the lock is held. This is
/// the same "serialized access can't be avoided anyway" discipline the
/// underlying `Engine` trait already documents.
pub struct MemTxnKv {
    engine: Mutex<Memory>,
}

impl Default for MemTxnKv {
    fn default() -> Self {
        Self::new()
    }
}

impl MemTxnKv {
    pub fn new() -> Self {
        MemTxnKv { engine: Mutex::new(Memory::new()) }
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut Memory) -> CResult<T>) -> CResult<T> {
        let mut engine = self.engine.lock().expect("kv engine mutex poisoned");
        f(&mut engine)
    }
}

impl TxnKv for MemTxnKv {
    fn load(&self, key: &str) -> CResult<String> {
        self.with_engine(|e| {
            e.get(key.as_bytes())?
                .map(|v| String::from_utf8_lossy(&v).into_owned())
                .ok_or_else(|| KvError::NotFound(key.to_string()))
        })
    }

    fn load_with_prefix(&self, prefix: &str) -> CResult<Vec<(String, String)>> {
        self.with_engine(|e| {
            e.scan_prefix(prefix.as_bytes())
                .map(|item| {
                    let (k, v) = item?;
                    Ok((
                        String::from_utf8_lossy(&k).into_owned(),
                        String::from_utf8_lossy(&v).into_owned(),
                    ))
                })
                .collect::<CResult<Vec<_>>>()
        })
    }

    fn save(&self, key: &str, value: &str) -> CResult<()> {
        self.with_engine(|e| e.set(key.as_bytes(), value.as_bytes().to_vec()))
    }

    fn remove(&self, key: &str) -> CResult<()> {
        self.with_engine(|e| e.delete(key.as_bytes()).map(|_| ()))
    }

    fn multi_save(&self, kvs: &[(String, String)]) -> CResult<()> {
        self.with_engine(|e| {
            for (k, v) in kvs {
                e.set(k.as_bytes(), v.as_bytes().to_vec())?;
            }
            Ok(())
        })
    }

    fn multi_remove(&self, keys: &[String]) -> CResult<()> {
        self.with_engine(|e| {
            for k in keys {
                e.delete(k.as_bytes())?;
            }
            Ok(())
        })
    }

    fn multi_save_and_remove(&self, saves: &[(String, String)], removes: &[String]) -> CResult<()> {
        self.with_engine(|e| {
            for (k, v) in saves {
                e.set(k.as_bytes(), v.as_bytes().to_vec())?;
            }
            for k in removes {
                e.delete(k.as_bytes())?;
            }
            Ok(())
        })
    }
}

/// Injects a failure into the next `n` mutating calls, for exercising the
/// metadata table's reload-on-failure path in tests. Wraps any `TxnKv` so
/// tests don't need a bespoke mock per case.
pub struct FaultyTxnKv<K: TxnKv> {
    inner: K,
    fail_next: std::sync::atomic::AtomicUsize,
}

impl<K: TxnKv> FaultyTxnKv<K> {
    pub fn new(inner: K) -> Self {
        FaultyTxnKv { inner, fail_next: std::sync::atomic::AtomicUsize::new(0) }
    }

    /// The next `n` mutating calls (save/remove/multi_*) fail with
    /// `KvError::Backend` instead of reaching the inner store.
    pub fn fail_next_mutations(&self, n: usize) {
        self.fail_next.store(n, std::sync::atomic::Ordering::SeqCst);
    }

    fn maybe_fail(&self) -> CResult<()> {
        let mut current = self.fail_next.load(std::sync::atomic::Ordering::SeqCst);
        loop {
            if current == 0 {
                return Ok(());
            }
            match self.fail_next.compare_exchange(
                current,
                current - 1,
                std::sync::atomic::Ordering::SeqCst,
                std::sync::atomic::Ordering::SeqCst,
            ) {
                Ok(_) => return Err(KvError::Backend("injected failure".to_string())),
                Err(observed) => current = observed,
            }
        }
    }
}

impl<K: TxnKv> TxnKv for FaultyTxnKv<K> {
    fn load(&self, key: &str) -> CResult<String> {
        self.inner.load(key)
    }

    fn load_with_prefix(&self, prefix: &str) -> CResult<Vec<(String, String)>> {
        self.inner.load_with_prefix(prefix)
    }

    fn save(&self, key: &str, value: &str) -> CResult<()> {
        self.maybe_fail()?;
        self.inner.save(key, value)
    }

    fn remove(&self, key: &str) -> CResult<()> {
        self.maybe_fail()?;
        self.inner.remove(key)
    }

    fn multi_save(&self, kvs: &[(String, String)]) -> CResult<()> {
        self.maybe_fail()?;
        self.inner.multi_save(kvs)
    }

    fn multi_remove(&self, keys: &[String]) -> CResult<()> {
        self.maybe_fail()?;
        self.inner.multi_remove(keys)
    }

    fn multi_save_and_remove(&self, saves: &[(String, String)], removes: &[String]) -> CResult<()> {
        self.maybe_fail()?;
        self.inner.multi_save_and_remove(saves, removes)
    }
}
