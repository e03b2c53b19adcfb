//! Persistence contract for match logs.

use super::Result;
use super::types::LogEntry;

/// Append-only store of [`LogEntry`] frames.
///
/// Offsets are opaque positions returned by [`TurnLog::append`]; reading at
/// an offset yields the entry and the offset of the one after it.
pub trait TurnLog: Send + Sync {
    /// Returns the offset the entry was written at.
    fn append(&mut self, entry: &LogEntry) -> Result<u64>;

    /// `None` once `offset` reaches the end of the log.
    fn read_at_offset(&self, offset: u64) -> Result<Option<(LogEntry, u64)>>;

    fn flush(&mut self) -> Result<()>;

    fn size(&self) -> Result<u64>;

    fn session_id(&self) -> &str;

    /// Reads every entry from the start.
    fn read_all(&self) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while let Some((entry, next)) = self.read_at_offset(offset)? {
            entries.push(entry);
            offset = next;
        }
        Ok(entries)
    }
}
