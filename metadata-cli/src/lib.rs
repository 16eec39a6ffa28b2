//! Demo binary for the metadata catalog. [Author fengyang]
//!
//! Exercises `metadata::MetaTable`'s public contract sequentially, the way
//! a caller adapter would, without a gRPC service around it.

pub mod config;
pub mod trace;
