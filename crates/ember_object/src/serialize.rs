//! Entity-reference serialisation.
//!
//! A raw in-memory reference cannot be written to a persistent backend, so
//! references go over the wire as the referent's **full name**: a standard
//! archive string, with the empty string encoding a null reference. Loading
//! resolves the name through the identity registry. This is a versioned
//! wire-format decision: changing the scheme changes the stream layout.

use ember_archive::{Archive, ArchiveError};

use crate::object::{Object, ObjectRef};
use crate::ptr::ObjectPtr;
use crate::registry::ObjectRegistry;

/// Serialises an owning object reference.
///
/// Saving writes the referent's full name (empty for null). Loading reads a
/// name and overwrites `slot`: null for the empty string, otherwise an
/// owning handle to the registered object of that name.
///
/// # Errors
///
/// Returns [`ArchiveError::UnresolvedReference`] when loading a non-empty
/// name that no registered object carries, or any underlying archive error.
pub fn serialize_object_ptr(
    archive: &mut dyn Archive,
    registry: &ObjectRegistry,
    slot: &mut ObjectPtr<dyn Object>,
) -> Result<(), ArchiveError> {
    if archive.is_loading() {
        let mut name = String::new();
        archive.serialize_string(&mut name)?;
        *slot = if name.is_empty() {
            ObjectPtr::null()
        } else {
            registry
                .find_object(&name)
                .ok_or(ArchiveError::UnresolvedReference(name))?
        };
    } else if archive.is_saving() {
        let mut name = slot
            .get()
            .map(|object| object.base().full_name())
            .unwrap_or_default();
        archive.serialize_string(&mut name)?;
    }
    Ok(())
}

/// Serialises a non-owning object reference with the same wire format as
/// [`serialize_object_ptr`].
///
/// When saving, a present reference must point at a live object. A loaded
/// reference does not retain the referent; the caller keeps it alive through
/// the usual ownership protocol.
///
/// # Errors
///
/// Same conditions as [`serialize_object_ptr`].
pub fn serialize_object(
    archive: &mut dyn Archive,
    registry: &ObjectRegistry,
    slot: &mut Option<ObjectRef>,
) -> Result<(), ArchiveError> {
    if archive.is_loading() {
        let mut name = String::new();
        archive.serialize_string(&mut name)?;
        *slot = if name.is_empty() {
            None
        } else {
            let found = registry
                .find_object(&name)
                .ok_or(ArchiveError::UnresolvedReference(name))?;
            found.get().map(|object| ObjectRef::of(object))
        };
    } else if archive.is_saving() {
        // SAFETY: the caller guarantees a present reference is live while
        // it is being saved.
        let mut name = slot
            .map(|entry| unsafe { entry.object() }.base().full_name())
            .unwrap_or_default();
        archive.serialize_string(&mut name)?;
    }
    Ok(())
}
