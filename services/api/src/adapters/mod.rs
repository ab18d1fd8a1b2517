//! services/api/src/adapters/mod.rs
//!
//! Concrete implementations of the core ports.

pub mod file_store;
pub mod pg_store;
pub mod quran_catalog;
