//! In-memory archive backend.

use crate::archive::{Archive, ArchiveFlags};
use crate::error::ArchiveError;

/// An archive backed by a growable byte buffer with a cursor.
///
/// Saving appends or overwrites bytes at the cursor and advances it, growing
/// the buffer as needed. Loading reads bytes at the cursor and advances it;
/// reading past the end fails with [`ArchiveError::OutOfBounds`] rather than
/// returning zero-filled or garbage data.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    flags: ArchiveFlags,
    data: Vec<u8>,
    position: usize,
}

impl MemoryArchive {
    /// Creates a saving archive over an empty buffer.
    #[must_use]
    pub fn writer() -> Self {
        Self {
            flags: ArchiveFlags::SAVING | ArchiveFlags::BINARY | ArchiveFlags::VOLATILE,
            data: Vec::new(),
            position: 0,
        }
    }

    /// Creates a loading archive over existing bytes, cursor at the start.
    #[must_use]
    pub fn reader(data: Vec<u8>) -> Self {
        Self {
            flags: ArchiveFlags::LOADING | ArchiveFlags::BINARY | ArchiveFlags::VOLATILE,
            data,
            position: 0,
        }
    }

    /// Creates an archive with neither direction set.
    ///
    /// Legal per the protocol: every primitive operation on an inert archive
    /// succeeds without touching the caller's value or the buffer.
    #[must_use]
    pub fn inert() -> Self {
        Self {
            flags: ArchiveFlags::BINARY | ArchiveFlags::VOLATILE,
            data: Vec::new(),
            position: 0,
        }
    }

    /// Returns the serialised bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the archive and returns its buffer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Archive for MemoryArchive {
    fn flags(&self) -> ArchiveFlags {
        self.flags
    }

    fn seek(&mut self, position: u64) -> Result<(), ArchiveError> {
        if position > self.data.len() as u64 {
            return Err(ArchiveError::OutOfBounds {
                offset: position,
                requested: 0,
                total: self.data.len() as u64,
            });
        }
        self.position = position as usize;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.position as u64
    }

    fn total_size(&self) -> u64 {
        self.data.len() as u64
    }

    fn serialize_bytes(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError> {
        if self.is_loading() {
            let end = self.position + buf.len();
            if end > self.data.len() {
                return Err(ArchiveError::OutOfBounds {
                    offset: self.position as u64,
                    requested: buf.len() as u64,
                    total: self.data.len() as u64,
                });
            }
            buf.copy_from_slice(&self.data[self.position..end]);
            self.position = end;
        } else if self.is_saving() {
            let end = self.position + buf.len();
            if end > self.data.len() {
                self.data.resize(end, 0);
            }
            self.data[self.position..end].copy_from_slice(buf);
            self.position = end;
        }
        Ok(())
    }
}
