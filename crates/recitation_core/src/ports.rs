//! crates/recitation_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the planner's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage backends, reference datasets, clocks and
//! random number generators.

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::RngCore;

use crate::domain::TextUnit;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Opaque key-value persistence. The core reads it at startup and writes the
/// whole updated value back after every mutation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    async fn load(&self, key: &str) -> PortResult<Option<String>>;

    /// Inserts or replaces the value stored under `key`.
    async fn save(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Read-only access to the reference catalog of text units.
#[async_trait]
pub trait TextCatalog: Send + Sync {
    async fn list_units(&self) -> PortResult<Vec<TextUnit>>;

    /// Every unit with at least one verse in any of the given groups, ordered by unit number.
    async fn units_in_groups(&self, group_ids: &[u32]) -> PortResult<Vec<TextUnit>>;

    async fn list_groups(&self) -> PortResult<Vec<u32>>;
}

/// Source of uniform randomness used for shuffling draws.
///
/// Injected so tests and replays can substitute a deterministic source.
pub trait RandomSource: Send + Sync {
    /// The generator draws are made from.
    fn rng(&mut self) -> &mut dyn RngCore;
}

/// Provides the observer's current local calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
