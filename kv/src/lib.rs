//! `kv` implements the transactional key/value contract that the metadata
//! catalog (see the `metadata` crate) is built on: point get/put/delete,
//! prefix scan, and atomic multi-key writes.
//!
//! [`storage::engine::Engine`] is the raw single-threaded byte store, kept
//! from the original key/value engine design. [`contract::TxnKv`] is the
//! `Send + Sync` contract the catalog actually consumes; [`contract::MemTxnKv`]
//! implements it directly over an in-memory [`storage::memory::Memory`]
//! engine, and the `etcd` feature adds [`etcd::EtcdTxnKv`], backed by a real
//! distributed-consensus store.

pub mod contract;
pub mod error;
pub mod storage;

#[cfg(feature = "etcd")]
pub mod etcd;
