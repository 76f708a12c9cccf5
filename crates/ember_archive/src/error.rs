//! Serialisation-layer error types.

/// Errors that can occur while loading from or saving to an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// A read or seek went past the end of the underlying buffer.
    #[error("access of {requested} bytes at offset {offset} is out of bounds (total size {total})")]
    OutOfBounds {
        /// Offset the access started at.
        offset: u64,
        /// Number of bytes the access needed.
        requested: u64,
        /// Total size of the backing storage.
        total: u64,
    },

    /// A length prefix claims more elements than the archive can still hold.
    ///
    /// Raised before any resize is driven by the prefix, so corrupt or
    /// adversarial input cannot exhaust memory.
    #[error("length prefix {count} exceeds the {remaining} bytes remaining in the archive")]
    LengthOverrun {
        /// The decoded element count.
        count: u64,
        /// Bytes left between the cursor and the end of the archive.
        remaining: u64,
    },

    /// A serialised string was not valid UTF-8.
    #[error("serialised string is not valid UTF-8: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),

    /// An underlying file operation failed.
    #[error("archive I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An object reference named an entity that is not registered.
    #[error("object reference '{0}' does not resolve to a registered object")]
    UnresolvedReference(String),
}
