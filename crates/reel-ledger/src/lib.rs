//! Job ledger.
//!
//! One row per prompt/video, tracking its lifecycle stage. Rows are
//! addressed by identifier through the [`Ledger`] trait so the backing
//! store (Google Sheets, memory) can be swapped without touching callers.
//! [`LedgerWriter`] layers the stage "mark" operations on top and refuses
//! any transition that would move a row backwards.
//!
//! Writes assume a single writer per run; there is no locking across the
//! read-then-write of an update.

pub mod error;
pub mod memory;
pub mod sheets;
pub mod store;
pub mod token_cache;
pub mod writer;

pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryLedger;
pub use sheets::{SheetsConfig, SheetsLedger};
pub use store::{Ledger, LedgerUpdate};
pub use token_cache::{BearerAuth, StaticToken, TokenCache};
pub use writer::LedgerWriter;
