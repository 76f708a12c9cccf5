//! The [`Archive`] trait and its wire format.
//!
//! An archive is constructed for exactly one direction (loading or saving)
//! and every primitive operation honours that direction: when loading it
//! overwrites the caller's variable with the next value from the backend,
//! when saving it writes the caller's current value. Callers never branch on
//! direction themselves; a single serialisation routine works both ways.
//!
//! ## Wire format
//!
//! All encodings are little-endian and unpadded:
//!
//! - integers and floats: their exact width, LE byte order;
//! - `bool`: one byte, `0` or `1` written, any non-zero byte reads as `true`;
//! - strings: `u32` byte-length prefix followed by UTF-8 bytes;
//! - sequences: `u32` element-count prefix followed by the elements in order.
//!   An empty sequence is exactly a four-byte zero prefix.
//!
//! Length prefixes read while loading are bounded against the bytes remaining
//! in the archive *before* they drive any allocation (see
//! [`Archive::check_remaining`]).

use crate::error::ArchiveError;

/// Descriptive and directional capabilities of an archive.
///
/// Power-of-two bit positions 0 through 5, combinable with `|` and tested
/// with [`ArchiveFlags::contains`]. `LOADING` and `SAVING` are fixed at
/// construction and mutually exclusive when the archive is used correctly;
/// an archive with neither is inert: its primitive operations do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveFlags(u32);

impl ArchiveFlags {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// The archive reads data out of its backend.
    pub const LOADING: Self = Self(1 << 0);
    /// The archive writes data into its backend.
    pub const SAVING: Self = Self(1 << 1);
    /// Binary encoding.
    pub const BINARY: Self = Self(1 << 2);
    /// Text encoding.
    pub const TEXT: Self = Self(1 << 3);
    /// Backed by persistent storage (a file).
    pub const PERSISTENT: Self = Self(1 << 4);
    /// Backed by volatile storage (a memory buffer).
    pub const VOLATILE: Self = Self(1 << 5);

    /// Returns the raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reconstructs flags from a raw bit pattern.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns `true` if any of the given bits are set.
    #[must_use]
    pub const fn contains(self, flags: Self) -> bool {
        self.0 & flags.0 != 0
    }
}

impl std::ops::BitOr for ArchiveFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ArchiveFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for ArchiveFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::BitAndAssign for ArchiveFlags {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl std::ops::Not for ArchiveFlags {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Generates the symmetric primitive operation for one fixed-width type.
macro_rules! serialize_primitive {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns an error if the backend read or write fails.
        fn $name(&mut self, value: &mut $ty) -> Result<(), ArchiveError> {
            let mut bytes = value.to_le_bytes();
            self.serialize_bytes(&mut bytes)?;
            if self.is_loading() {
                *value = <$ty>::from_le_bytes(bytes);
            }
            Ok(())
        }
    };
}

/// A bidirectional serialisation protocol over a byte-oriented backend.
///
/// Backends implement the position control methods and the single raw
/// primitive [`Archive::serialize_bytes`]; every typed operation is provided
/// on top of it and is identical across backends.
pub trait Archive {
    /// The capabilities this archive was constructed with.
    fn flags(&self) -> ArchiveFlags;

    /// Moves the cursor to an absolute byte position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is outside the backend's bounds or
    /// the underlying seek fails.
    fn seek(&mut self, position: u64) -> Result<(), ArchiveError>;

    /// Returns the current cursor position.
    fn tell(&self) -> u64;

    /// Returns the total size of the backing storage in bytes.
    fn total_size(&self) -> u64;

    /// The raw primitive: when loading, fills `buf` with the next
    /// `buf.len()` bytes; when saving, writes `buf` to the backend. An inert
    /// archive leaves `buf` untouched and succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::OutOfBounds`] when a buffer-backed load runs
    /// past the end, or [`ArchiveError::Io`] when a file operation fails.
    fn serialize_bytes(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError>;

    /// Returns `true` if this archive reads data out of its backend.
    fn is_loading(&self) -> bool {
        self.flags().contains(ArchiveFlags::LOADING)
    }

    /// Returns `true` if this archive writes data into its backend.
    fn is_saving(&self) -> bool {
        self.flags().contains(ArchiveFlags::SAVING)
    }

    /// Returns `true` if this archive uses a binary encoding.
    fn is_binary(&self) -> bool {
        self.flags().contains(ArchiveFlags::BINARY)
    }

    /// Returns `true` if this archive uses a text encoding.
    fn is_text(&self) -> bool {
        self.flags().contains(ArchiveFlags::TEXT)
    }

    /// Returns `true` if this archive is backed by persistent storage.
    fn is_persistent(&self) -> bool {
        self.flags().contains(ArchiveFlags::PERSISTENT)
    }

    /// Bounds a decoded element count against the bytes remaining in the
    /// archive, assuming at least one byte per element.
    ///
    /// Call this after reading a length prefix and before resizing any
    /// destination, so an implausible prefix fails instead of driving an
    /// allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::LengthOverrun`] if `count` elements cannot fit
    /// in the remaining bytes.
    fn check_remaining(&self, count: u64) -> Result<(), ArchiveError> {
        let remaining = self.total_size().saturating_sub(self.tell());
        if count > remaining {
            return Err(ArchiveError::LengthOverrun { count, remaining });
        }
        Ok(())
    }

    /// Serialises a `bool` as a single byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or write fails.
    fn serialize_bool(&mut self, value: &mut bool) -> Result<(), ArchiveError> {
        let mut byte = u8::from(*value);
        self.serialize_bytes(std::slice::from_mut(&mut byte))?;
        if self.is_loading() {
            *value = byte != 0;
        }
        Ok(())
    }

    serialize_primitive!(
        /// Serialises an `i8`.
        serialize_i8, i8);
    serialize_primitive!(
        /// Serialises a `u8`.
        serialize_u8, u8);
    serialize_primitive!(
        /// Serialises an `i16`.
        serialize_i16, i16);
    serialize_primitive!(
        /// Serialises a `u16`.
        serialize_u16, u16);
    serialize_primitive!(
        /// Serialises an `i32`.
        serialize_i32, i32);
    serialize_primitive!(
        /// Serialises a `u32`.
        serialize_u32, u32);
    serialize_primitive!(
        /// Serialises an `i64`.
        serialize_i64, i64);
    serialize_primitive!(
        /// Serialises a `u64`.
        serialize_u64, u64);
    serialize_primitive!(
        /// Serialises an `f32`.
        serialize_f32, f32);
    serialize_primitive!(
        /// Serialises an `f64`.
        serialize_f64, f64);

    /// Serialises a string as a `u32` byte-length prefix plus UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails, the length prefix overruns the
    /// archive, or the loaded bytes are not valid UTF-8.
    fn serialize_string(&mut self, value: &mut String) -> Result<(), ArchiveError> {
        if self.is_loading() {
            let mut len = 0u32;
            self.serialize_u32(&mut len)?;
            self.check_remaining(u64::from(len))?;
            let mut bytes = vec![0u8; len as usize];
            self.serialize_bytes(&mut bytes)?;
            *value = String::from_utf8(bytes)?;
        } else if self.is_saving() {
            let mut len = value.len() as u32;
            self.serialize_u32(&mut len)?;
            let mut bytes = value.clone().into_bytes();
            self.serialize_bytes(&mut bytes)?;
        }
        Ok(())
    }
}

/// Element-wise serialisation through an [`Archive`].
///
/// Implemented for every primitive the protocol covers and for `Vec<T>` of
/// such elements, so nested sequences compose.
pub trait Persist {
    /// Loads or saves `self` through the archive, honouring its direction.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying archive operation fails.
    fn persist(&mut self, archive: &mut dyn Archive) -> Result<(), ArchiveError>;
}

macro_rules! impl_persist {
    ($ty:ty, $method:ident) => {
        impl Persist for $ty {
            fn persist(&mut self, archive: &mut dyn Archive) -> Result<(), ArchiveError> {
                archive.$method(self)
            }
        }
    };
}

impl_persist!(bool, serialize_bool);
impl_persist!(i8, serialize_i8);
impl_persist!(u8, serialize_u8);
impl_persist!(i16, serialize_i16);
impl_persist!(u16, serialize_u16);
impl_persist!(i32, serialize_i32);
impl_persist!(u32, serialize_u32);
impl_persist!(i64, serialize_i64);
impl_persist!(u64, serialize_u64);
impl_persist!(f32, serialize_f32);
impl_persist!(f64, serialize_f64);
impl_persist!(String, serialize_string);

impl<T: Persist + Default> Persist for Vec<T> {
    /// Sequences carry a `u32` element-count prefix. When loading, the
    /// destination is cleared and resized to the (bounds-checked) count
    /// before the elements are serialised in order.
    fn persist(&mut self, archive: &mut dyn Archive) -> Result<(), ArchiveError> {
        let mut len = self.len() as u32;
        archive.serialize_u32(&mut len)?;
        if archive.is_loading() {
            archive.check_remaining(u64::from(len))?;
            self.clear();
            self.resize_with(len as usize, T::default);
        }
        for element in self.iter_mut() {
            element.persist(archive)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_bit_positions() {
        assert_eq!(ArchiveFlags::LOADING.bits(), 1);
        assert_eq!(ArchiveFlags::SAVING.bits(), 2);
        assert_eq!(ArchiveFlags::BINARY.bits(), 4);
        assert_eq!(ArchiveFlags::TEXT.bits(), 8);
        assert_eq!(ArchiveFlags::PERSISTENT.bits(), 16);
        assert_eq!(ArchiveFlags::VOLATILE.bits(), 32);
    }

    #[test]
    fn test_flags_combine_and_test() {
        let flags = ArchiveFlags::LOADING | ArchiveFlags::BINARY;
        assert!(flags.contains(ArchiveFlags::LOADING));
        assert!(flags.contains(ArchiveFlags::BINARY));
        assert!(!flags.contains(ArchiveFlags::SAVING));
        assert_eq!(ArchiveFlags::NONE.bits(), 0);
    }

    #[test]
    fn test_flags_removal() {
        let mut flags = ArchiveFlags::LOADING | ArchiveFlags::VOLATILE;
        flags &= !ArchiveFlags::VOLATILE;
        assert!(flags.contains(ArchiveFlags::LOADING));
        assert!(!flags.contains(ArchiveFlags::VOLATILE));
    }
}
