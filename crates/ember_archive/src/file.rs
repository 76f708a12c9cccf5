//! File archive backend.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::archive::{Archive, ArchiveFlags};
use crate::error::ArchiveError;

/// An archive backed by an open binary file handle.
///
/// The file is opened at construction: for reading when loading (failing if
/// the file is absent), or created/truncated for writing when saving. A
/// failed open is an `Err` from the constructor, so a `FileArchive` value
/// always holds an open handle; the handle is released by `Drop` on every
/// exit path.
#[derive(Debug)]
pub struct FileArchive {
    flags: ArchiveFlags,
    file: File,
    position: u64,
}

impl FileArchive {
    /// Opens an existing file for loading.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the file cannot be opened.
    pub fn open_read(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(path = %path.display(), "file archive opened for loading");
        Ok(Self {
            flags: ArchiveFlags::LOADING | ArchiveFlags::BINARY | ArchiveFlags::PERSISTENT,
            file,
            position: 0,
        })
    }

    /// Creates or truncates a file for saving.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(path = %path.display(), "file archive opened for saving");
        Ok(Self {
            flags: ArchiveFlags::SAVING | ArchiveFlags::BINARY | ArchiveFlags::PERSISTENT,
            file,
            position: 0,
        })
    }

    /// Reports whether the archive holds an open handle.
    ///
    /// Always `true` for a constructed archive; a failed open never
    /// produces a `FileArchive` in the first place.
    #[must_use]
    pub fn is_open(&self) -> bool {
        true
    }
}

impl Archive for FileArchive {
    fn flags(&self) -> ArchiveFlags {
        self.flags
    }

    fn seek(&mut self, position: u64) -> Result<(), ArchiveError> {
        self.file.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.position
    }

    fn total_size(&self) -> u64 {
        self.file.metadata().map_or(0, |meta| meta.len())
    }

    fn serialize_bytes(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError> {
        if self.is_loading() {
            self.file.read_exact(buf)?;
            self.position += buf.len() as u64;
        } else if self.is_saving() {
            self.file.write_all(buf)?;
            self.position += buf.len() as u64;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Persist;

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");

        {
            let mut writer = FileArchive::create(&path).unwrap();
            assert!(writer.is_open());
            assert!(writer.is_saving());
            assert!(writer.is_persistent());

            let mut count = 3u32;
            let mut name = String::from("level_01");
            let mut scores = vec![9.5f64, -1.25];
            writer.serialize_u32(&mut count).unwrap();
            writer.serialize_string(&mut name).unwrap();
            scores.persist(&mut writer).unwrap();
        }

        let mut reader = FileArchive::open_read(&path).unwrap();
        assert!(reader.is_loading());

        let mut count = 0u32;
        let mut name = String::new();
        let mut scores: Vec<f64> = Vec::new();
        reader.serialize_u32(&mut count).unwrap();
        reader.serialize_string(&mut name).unwrap();
        scores.persist(&mut reader).unwrap();

        assert_eq!(count, 3);
        assert_eq!(name, "level_01");
        assert_eq!(scores, vec![9.5, -1.25]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileArchive::open_read(dir.path().join("missing.bin"));
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }

    #[test]
    fn test_truncated_file_read_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");

        {
            let mut writer = FileArchive::create(&path).unwrap();
            let mut byte = 0xFFu8;
            writer.serialize_u8(&mut byte).unwrap();
        }

        let mut reader = FileArchive::open_read(&path).unwrap();
        let mut value = 0u64;
        let err = reader.serialize_u64(&mut value).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[test]
    fn test_seek_and_total_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seek.bin");

        {
            let mut writer = FileArchive::create(&path).unwrap();
            let mut a = 1u32;
            let mut b = 2u32;
            writer.serialize_u32(&mut a).unwrap();
            writer.serialize_u32(&mut b).unwrap();
            assert_eq!(writer.tell(), 8);
            assert_eq!(writer.total_size(), 8);
        }

        let mut reader = FileArchive::open_read(&path).unwrap();
        reader.seek(4).unwrap();
        let mut b = 0u32;
        reader.serialize_u32(&mut b).unwrap();
        assert_eq!(b, 2);
        assert_eq!(reader.tell(), 8);
    }
}
