//! Public runtime API surface.
//!
//! Types consumers of the runtime interact with, kept apart from the
//! orchestration and persistence code.

pub mod abort;
pub mod errors;
pub mod events;

pub use abort::AbortHandle;
pub use errors::{Result, RuntimeError, StateDump};
pub use events::{MatchEvent, OracleCall};
