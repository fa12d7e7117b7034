//! Balance ledger and request-lifecycle engine.

pub mod catalog;
pub mod conflicts;
pub mod consumption;
pub mod events;
pub mod impact;
pub mod lifecycle;

pub use catalog::LeaveTypeCatalog;
pub use conflicts::ConflictRecord;
pub use events::LedgerEvent;
pub use impact::{Impact, compute_impact, inclusive_day_count};
pub use lifecycle::{BalanceUpdate, LedgerEngine, Outcome};
