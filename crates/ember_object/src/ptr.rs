//! Owning object handles.
//!
//! [`ObjectPtr`] implements shared ownership through the object's own
//! intrusive counter; there is no separate control block. A fresh handle
//! adopts the implicit reference the object is constructed with; clones
//! increment, drops decrement, and the drop that observes the 1→0 transition
//! reclaims the allocation exactly once.

use std::ptr::NonNull;

use crate::object::Object;

/// A shared-ownership handle to an object.
///
/// Validity reports purely whether a referent is present: a pending-kill
/// object stays "valid" through this handle until its count reaches zero.
/// Handles are `!Send`/`!Sync`: the object graph is thread-confined, only
/// the counter itself is atomic.
pub struct ObjectPtr<T: Object + ?Sized> {
    ptr: Option<NonNull<T>>,
}

impl<T: Object + ?Sized> ObjectPtr<T> {
    /// A handle referring to nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self { ptr: None }
    }

    /// Takes ownership of a freshly allocated object.
    ///
    /// The object's counter is already 1 (the creator's implicit reference),
    /// which this handle adopts without incrementing.
    #[must_use]
    pub fn from_box(object: Box<T>) -> Self {
        Self {
            ptr: NonNull::new(Box::into_raw(object)),
        }
    }

    /// Returns the referent, or `None` for a null handle.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: this handle holds a counted reference, so a present
        // referent is alive.
        self.ptr.map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Returns `true` if a referent is present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ptr.is_some()
    }
}

impl<T: Object> ObjectPtr<T> {
    /// Returns a type-erased handle to the same object, retaining it.
    #[must_use]
    pub fn to_dyn(&self) -> ObjectPtr<dyn Object> {
        match self.ptr {
            Some(ptr) => {
                // SAFETY: this handle keeps the object alive.
                unsafe { ptr.as_ref() }.base().add_ref();
                let wide: NonNull<dyn Object> = ptr;
                ObjectPtr { ptr: Some(wide) }
            }
            None => ObjectPtr::null(),
        }
    }
}

impl ObjectPtr<dyn Object> {
    /// Builds an owning handle from a pointer whose reference has already
    /// been counted (registry upgrades).
    pub(crate) fn from_retained(ptr: NonNull<dyn Object>) -> Self {
        Self { ptr: Some(ptr) }
    }

    /// Returns a typed handle if the concrete type is `T`, retaining the
    /// object. A null handle or a type mismatch yields `None`.
    #[must_use]
    pub fn downcast<T: Object>(&self) -> Option<ObjectPtr<T>> {
        let ptr = self.ptr?;
        // SAFETY: this handle keeps the object alive.
        let object = unsafe { ptr.as_ref() };
        if !object.as_any().is::<T>() {
            return None;
        }
        object.base().add_ref();
        // The vtable can be discarded: the concrete type was just checked.
        Some(ObjectPtr {
            ptr: NonNull::new(ptr.as_ptr() as *mut T),
        })
    }
}

impl<T: Object + ?Sized> Clone for ObjectPtr<T> {
    fn clone(&self) -> Self {
        if let Some(ptr) = self.ptr {
            // SAFETY: this handle keeps the object alive.
            unsafe { ptr.as_ref() }.base().add_ref();
        }
        Self { ptr: self.ptr }
    }
}

impl<T: Object + ?Sized> Drop for ObjectPtr<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr {
            // SAFETY: this handle holds a counted reference.
            let last = unsafe { ptr.as_ref() }.base().release();
            if last {
                // SAFETY: the counter transitioned 1→0 in this call, so this
                // is the single handle responsible for reclamation.
                drop(unsafe { Box::from_raw(ptr.as_ptr()) });
            }
        }
    }
}

impl<T: Object + ?Sized> Default for ObjectPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Object + ?Sized> PartialEq for ObjectPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self.ptr, other.ptr) {
            (Some(a), Some(b)) => std::ptr::addr_eq(a.as_ptr(), b.as_ptr()),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Object + ?Sized> Eq for ObjectPtr<T> {}

impl<T: Object + ?Sized> std::fmt::Debug for ObjectPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(object) => write!(
                f,
                "ObjectPtr({} '{}', count {})",
                object.base().class().name(),
                object.base().name(),
                object.base().ref_count()
            ),
            None => write!(f, "ObjectPtr(null)"),
        }
    }
}
