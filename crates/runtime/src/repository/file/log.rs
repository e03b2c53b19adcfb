//! Append-only log file repository.
//!
//! `FileRepository<T>` stores any serializable type as a sequence of
//! length-prefixed bincode frames. [`FileTurnLog`] is the instantiation used
//! for persisted matches.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::mem;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::repository::traits::TurnLog;
use crate::repository::types::LogEntry;
use crate::repository::{RepositoryError, Result};

const WRITE_BUFFER: usize = 1024 * 1024;
const LENGTH_PREFIX: u64 = 4;

/// Append-only file of `T` frames:
///
/// ```text
/// [u32 length LE][bincode serialized T]
/// [u32 length LE][bincode serialized T]
/// ...
/// ```
///
/// Reads go through a separate handle and only see flushed frames. A failed
/// flush discards every frame appended since the last successful one.
pub struct FileRepository<T> {
    session_id: String,
    path: PathBuf,
    writer: BufWriter<File>,
    current_offset: u64,
    committed_offset: u64,
    poisoned: bool,
    _phantom: PhantomData<fn() -> T>,
}

/// Turn log backed by a file.
pub type FileTurnLog = FileRepository<LogEntry>;

impl<T> FileRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new log, refusing to overwrite an existing one.
    pub fn create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let filename = filename.as_ref();
        std::fs::create_dir_all(base_dir)?;

        let path = base_dir.join(filename);
        if path.exists() {
            return Err(RepositoryError::LogAlreadyExists(
                path.display().to_string(),
            ));
        }

        let file = OpenOptions::new().create_new(true).write(true).open(&path)?;
        tracing::debug!(path = %path.display(), "created turn log");
        Ok(Self::from_parts(filename, path, file, 0))
    }

    /// Opens an existing log for appending.
    pub fn open(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let filename = filename.as_ref();
        let path = base_dir.as_ref().join(filename);

        let file = OpenOptions::new().append(true).open(&path)?;
        let offset = file.metadata()?.len();
        tracing::debug!(path = %path.display(), offset, "opened turn log");
        Ok(Self::from_parts(filename, path, file, offset))
    }

    fn from_parts(filename: &str, path: PathBuf, file: File, current_offset: u64) -> Self {
        Self {
            session_id: filename.to_string(),
            path,
            writer: BufWriter::with_capacity(WRITE_BUFFER, file),
            current_offset,
            committed_offset: current_offset,
            poisoned: false,
            _phantom: PhantomData,
        }
    }

    /// Appends one frame and returns the offset it starts at.
    pub fn append(&mut self, item: &T) -> Result<u64> {
        self.ensure_usable()?;
        let offset = self.current_offset;
        let bytes =
            bincode::serialize(item).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let len = u32::try_from(bytes.len()).map_err(|_| {
            RepositoryError::Serialization(format!("entry of {} bytes is too large", bytes.len()))
        })?;

        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&bytes)?;
        self.current_offset += LENGTH_PREFIX + bytes.len() as u64;
        Ok(offset)
    }

    /// Reads the frame at `offset`, returning it with the next frame's offset.
    pub fn read_at_offset(&self, offset: u64) -> Result<Option<(T, u64)>> {
        let file = File::open(&self.path)?;
        let file_size = file.metadata()?.len();
        if offset >= file_size {
            return Ok(None);
        }
        if offset + LENGTH_PREFIX > file_size {
            return Err(RepositoryError::InvalidOffset {
                offset,
                size: file_size,
            });
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset))?;

        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut data = Vec::with_capacity(len);
        let read = reader.by_ref().take(len as u64).read_to_end(&mut data)?;
        if read < len {
            return Err(RepositoryError::PartialWrite {
                offset,
                expected: len,
                actual: read,
            });
        }

        let item = bincode::deserialize(&data).map_err(|e| {
            RepositoryError::CorruptedData(format!("frame at offset {offset}: {e}"))
        })?;
        Ok(Some((item, offset + LENGTH_PREFIX + len as u64)))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if let Err(error) = self.writer.flush() {
            if let Err(rollback) = self.discard_pending() {
                tracing::error!(
                    session = %self.session_id,
                    %rollback,
                    "failed to roll back turn log; refusing further writes"
                );
                self.poisoned = true;
            }
            return Err(error.into());
        }
        self.committed_offset = self.current_offset;
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(RepositoryError::Poisoned(self.session_id.clone()));
        }
        Ok(())
    }

    /// Drops buffered frames and truncates the file to the last committed
    /// offset, undoing any partially written frame.
    fn discard_pending(&mut self) -> Result<()> {
        self.current_offset = self.committed_offset;
        let file = self.writer.get_ref().try_clone()?;
        let stale = mem::replace(
            &mut self.writer,
            BufWriter::with_capacity(WRITE_BUFFER, file),
        );
        let (mut file, _unwritten) = stale.into_parts();
        file.set_len(self.committed_offset)?;
        file.seek(SeekFrom::Start(self.committed_offset))?;
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.current_offset
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Drop for FileRepository<T> {
    fn drop(&mut self) {
        if self.poisoned {
            return;
        }
        if let Err(error) = self.writer.flush() {
            tracing::warn!(
                session = %self.session_id,
                %error,
                "failed to flush turn log on drop"
            );
        }
    }
}

impl TurnLog for FileRepository<LogEntry> {
    fn append(&mut self, entry: &LogEntry) -> Result<u64> {
        FileRepository::append(self, entry)
    }

    fn read_at_offset(&self, offset: u64) -> Result<Option<(LogEntry, u64)>> {
        FileRepository::read_at_offset(self, offset)
    }

    fn flush(&mut self) -> Result<()> {
        FileRepository::flush(self)
    }

    fn size(&self) -> Result<u64> {
        Ok(FileRepository::size(self))
    }

    fn session_id(&self) -> &str {
        FileRepository::session_id(self)
    }
}
