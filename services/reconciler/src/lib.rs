//! Reconciliation engine
//!
//! Reconciles an unordered, possibly duplicated stream of per-channel
//! messages into one authoritative rocket state per channel.
//!
//! # Architecture
//!
//! ```text
//! validated RocketMessage
//!         │
//!   ┌─────▼──────┐   map lock: find-or-create only,
//!   │ Repository │   released before application
//!   └─────┬──────┘
//!         │ entry lock (one per channel)
//!   ┌─────▼──────┐
//!   │ Reconciler │── in-order: apply, then drain buffer
//!   └─────┬──────┘── future: hold in ordering buffer
//!         │
//!   ┌─────▼────────┐
//!   │MessageBuffer │  min-heap keyed by sequence number
//!   └──────────────┘
//! ```
//!
//! Channels are fully independent: no cross-channel ordering, no shared
//! state beyond the channel map itself.

pub mod buffer;
pub mod channel;
pub mod repository;
pub mod sort;
pub mod sync;

pub use channel::{Reconciler, SubmitOutcome};
pub use repository::{Repository, RepositoryConfig};
pub use sort::{SortField, SortOptions, SortOrder};
pub use sync::{ContextMutex, LockError};
