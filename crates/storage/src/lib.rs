//! Eventsheet storage
//!
//! Event records persisted in spreadsheet tables, one table per event type.
//!
//! - `range`: A1 range addressing
//! - `backend`: the `TableBackend` trait the spreadsheet client implements
//! - `memory`: in-memory backend for tests and demos
//! - `tabular`: padded row reads and writes on a named table
//! - `cache`: record cache and downstream invalidation hook
//! - `repository`: typed create/update/delete/list of event records
//! - `migration`: update routing and cross-table moves on type change

pub mod backend;
pub mod cache;
pub mod memory;
pub mod migration;
pub mod range;
pub mod repository;
pub mod tabular;

pub use backend::{BackendError, BackendOp, TableBackend};
pub use cache::{CacheError, CacheInvalidator, RecordCache};
pub use memory::InMemorySheet;
pub use migration::{Confidence, MigrationCoordinator, Resolution};
pub use range::A1Range;
pub use repository::{EventRepository, SavedEvent, EVENTS_CACHE_KEY};
pub use tabular::{TabularStore, FIRST_DATA_ROW};
