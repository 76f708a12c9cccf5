//! # ember_archive
//!
//! The serialisation substrate of the ember engine: a symmetric read/write
//! protocol over byte buffers and files.
//!
//! This crate provides:
//!
//! - [`Archive`] — the bidirectional serialisation trait. One routine, written
//!   once, both loads and saves by delegating to the archive's
//!   direction-aware primitive operations.
//! - [`Persist`] — element-wise serialisation for values and sequences.
//! - [`MemoryArchive`] — in-memory backend over a growable byte buffer.
//! - [`FileArchive`] — file backend over a binary file handle.
//! - [`ArchiveError`] — serialisation-layer error types.

pub mod archive;
pub mod error;
pub mod file;
pub mod memory;

pub use archive::{Archive, ArchiveFlags, Persist};
pub use error::ArchiveError;
pub use file::FileArchive;
pub use memory::MemoryArchive;
