//! Durable, in-memory catalog of tenants, proxies, collections, partitions,
//! and segments, backed by a [`kv::contract::TxnKv`] store.

pub mod cancellation;
pub mod config;
pub mod entities;
pub mod error;
mod keys;
pub mod serializer;
pub mod table;

pub use cancellation::Cancellation;
pub use config::MetaTableConfig;
pub use error::MetaError;
pub use table::MetaTable;
