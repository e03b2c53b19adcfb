//! Persistence of played matches.
//!
//! A match is stored as an append-only log: one genesis entry followed by one
//! [`TurnRecord`](fireatwill_core::TurnRecord) per resolved turn. Logs carry
//! every oracle answer, so [`replay_log`] rebuilds the final state offline.

mod error;
mod file;
mod memory;
mod replay;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::{FileRepository, FileTurnLog};
pub use memory::InMemoryTurnLog;
pub use replay::{ReplayedMatch, load_log, replay_log};
pub use traits::TurnLog;
pub use types::LogEntry;
