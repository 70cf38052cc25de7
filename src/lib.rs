// HireTrack - List screens for jobs, candidates and interviews over a JSONL+SQLite record store

pub mod config;
pub mod filter;
pub mod jsonl;
pub mod lookup;
pub mod memory;
pub mod models;
pub mod record;
pub mod screen;
pub mod screens;
pub mod store;
pub mod validation;
pub mod view;

// Re-export main types for convenience
pub use config::Config;
pub use filter::{Accessor, FilterKind, Predicate};
pub use lookup::{Labels, lookup};
pub use memory::MemoryStore;
pub use models::{Candidate, CandidateStage, Interview, Job, JobStatus, User, UserRole};
pub use record::{FieldValue, Record, new_id, now_ms};
pub use screen::{Screen, ScreenError};
pub use store::{RecordStore, Store};
pub use view::{DEFAULT_PAGE_SIZE, FilterDef, FilterSet, ListView, PageSlice};
