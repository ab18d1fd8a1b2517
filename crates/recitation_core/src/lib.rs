//! crates/recitation_core/src/lib.rs
//!
//! Recitation planning core. All I/O goes through the traits in `ports`.

pub mod clock;
pub mod domain;
pub mod history;
pub mod partition;
pub mod persistence;
pub mod planner;
pub mod pool;
pub mod ports;
pub mod random;
pub mod review;
pub mod scheduler;
pub mod state;
pub mod template;

pub use clock::{FixedClock, LocalClock};
pub use domain::{
    ChunkId, ChunkRange, DailyAssignment, DateKey, ReviewCandidate, Session, SessionAssignment,
    SessionCategory, TextUnit, UnitAssignment, VerseSpan,
};
pub use partition::ChunkSettings;
pub use persistence::{MemoryStore, StateRepository};
pub use planner::Planner;
pub use ports::{Clock, KeyValueStore, PortError, PortResult, RandomSource, TextCatalog};
pub use random::{SeededRandom, ThreadRandom};
pub use review::{ReviewItem, ReviewQueue};
pub use scheduler::{TemporaryEntry, UnknownSession};
pub use state::PlannerState;
pub use template::SessionTemplate;
