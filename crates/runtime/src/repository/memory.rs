use super::Result;
use super::traits::TurnLog;
use super::types::LogEntry;

/// Turn log held in memory. Offsets are entry indices.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTurnLog {
    session_id: String,
    entries: Vec<LogEntry>,
}

impl InMemoryTurnLog {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TurnLog for InMemoryTurnLog {
    fn append(&mut self, entry: &LogEntry) -> Result<u64> {
        self.entries.push(entry.clone());
        Ok(self.entries.len() as u64 - 1)
    }

    fn read_at_offset(&self, offset: u64) -> Result<Option<(LogEntry, u64)>> {
        Ok(self
            .entries
            .get(offset as usize)
            .map(|entry| (entry.clone(), offset + 1)))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.entries.len() as u64)
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}
