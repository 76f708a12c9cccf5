//! Object base state, the [`Object`] trait, and non-owning references.
//!
//! Every object embeds an [`ObjectBase`]: its identity (name), its place in
//! the ownership tree (`outer`), its runtime type (`class`), advisory state
//! flags, and the intrusive reference counter that owning handles share.
//!
//! The counter is the only concurrency-safe piece of the model. Everything
//! else is confined to one thread, which the type system enforces: mutable
//! object state lives behind `Cell`/`RefCell`, so handles are neither `Send`
//! nor `Sync`, while `add_ref`/`release` stay lock-free atomics per the
//! protocol.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};

use ember_archive::{Archive, ArchiveError};

use crate::class::Class;
use crate::flags::ObjectFlags;

/// Identity, ownership, flags, and the intrusive reference counter.
///
/// Constructed with the counter at 1: the creator holds the first reference
/// implicitly, and the owning handle built around the fresh allocation adopts
/// it without a further increment.
#[derive(Debug)]
pub struct ObjectBase {
    name: RefCell<String>,
    class: &'static Class,
    outer: Option<ObjectRef>,
    flags: Cell<ObjectFlags>,
    ref_count: AtomicU32,
}

impl ObjectBase {
    /// Creates base state for a new object of the given class.
    #[must_use]
    pub fn new(class: &'static Class, outer: Option<ObjectRef>, name: impl Into<String>) -> Self {
        Self {
            name: RefCell::new(name.into()),
            class,
            outer,
            flags: Cell::new(ObjectFlags::NEED_INITIALIZATION | ObjectFlags::CONSTRUCTED_OBJECT),
            ref_count: AtomicU32::new(1),
        }
    }

    /// Returns the object's own (unqualified) name.
    #[must_use]
    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    /// Renames the object.
    ///
    /// Renaming between registration and unregistration is a caller hazard:
    /// the registry removes entries by the name they carry at unregistration
    /// time.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    /// Returns the object's type descriptor.
    #[must_use]
    pub fn class(&self) -> &'static Class {
        self.class
    }

    /// Returns the non-owning back-reference to the containing object.
    #[must_use]
    pub fn outer(&self) -> Option<ObjectRef> {
        self.outer
    }

    /// Returns the current flag set.
    #[must_use]
    pub fn flags(&self) -> ObjectFlags {
        self.flags.get()
    }

    /// Overwrites the whole flag set.
    pub fn set_flags(&self, flags: ObjectFlags) {
        self.flags.set(flags);
    }

    /// Sets the given bits. Pure bitwise update, no side effects.
    pub fn add_flags(&self, flags: ObjectFlags) {
        self.flags.set(self.flags.get() | flags);
    }

    /// Clears the given bits. Pure bitwise update, no side effects.
    pub fn remove_flags(&self, flags: ObjectFlags) {
        self.flags.set(self.flags.get() & !flags);
    }

    /// Returns `true` if any of the given bits are set.
    #[must_use]
    pub fn has_flags(&self, flags: ObjectFlags) -> bool {
        self.flags.get().contains(flags)
    }

    /// Returns `true` once teardown has begun.
    #[must_use]
    pub fn is_pending_kill(&self) -> bool {
        self.has_flags(ObjectFlags::BEGIN_DESTROYED)
    }

    /// Increments the reference counter. Never fails.
    pub fn add_ref(&self) {
        self.ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements the reference counter.
    ///
    /// Returns `true` exactly when this call observed the transition from 1
    /// to 0; the caller that receives `true` owns the reclamation of the
    /// object's storage.
    #[must_use]
    pub fn release(&self) -> bool {
        self.ref_count.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Returns the current reference count.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Relaxed)
    }

    /// Returns the `.`-joined hierarchical name, root-first.
    ///
    /// Walks the `outer` chain to the root; cost is proportional to the
    /// ownership-tree depth. The chain must be a tree (never a cycle) and
    /// every outer must still be alive; both are invariants of the creation
    /// protocol, not runtime checks.
    #[must_use]
    pub fn full_name(&self) -> String {
        match self.outer {
            // SAFETY: outers outlive the objects they contain (creation
            // protocol), so the back-reference is valid here.
            Some(outer) => {
                let container = unsafe { outer.object() };
                format!("{}.{}", container.base().full_name(), self.name.borrow())
            }
            None => self.name.borrow().clone(),
        }
    }

    /// Returns the `/`-joined hierarchical path, root-first.
    ///
    /// Same preconditions as [`ObjectBase::full_name`].
    #[must_use]
    pub fn path_name(&self) -> String {
        match self.outer {
            // SAFETY: see `full_name`.
            Some(outer) => {
                let container = unsafe { outer.object() };
                format!("{}/{}", container.base().path_name(), self.name.borrow())
            }
            None => self.name.borrow().clone(),
        }
    }
}

/// The object contract: base state access plus lifecycle hooks.
///
/// Hooks default to no-ops; a concrete type overrides any subset. They take
/// `&self` because they are invoked through shared owning handles: mutable
/// per-type state belongs in `Cell`/`RefCell` fields, which also keeps one
/// `serialize` routine valid for both archive directions.
pub trait Object: Any {
    /// Returns the embedded base state.
    fn base(&self) -> &ObjectBase;

    /// Returns `self` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Runs once after construction and registration, before the owning
    /// handle is given to the creator.
    ///
    /// The default marks initialisation complete; an override that replaces
    /// it should keep the same flag bookkeeping.
    fn post_init_properties(&self) {
        self.base().remove_flags(ObjectFlags::NEED_INITIALIZATION);
        self.base().add_flags(ObjectFlags::INITIALIZED_PROPS);
    }

    /// Runs when the object enters play.
    fn begin_play(&self) {}

    /// Runs once per update with the elapsed time for this update.
    ///
    /// No ordering is guaranteed between sibling objects beyond the order
    /// the caller ticks them in.
    fn tick(&self, _delta_time: f32) {}

    /// Runs when the object leaves play.
    fn end_play(&self) {}

    /// Loads or saves the object's state through the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying archive operation fails.
    fn serialize(&self, _archive: &mut dyn Archive) -> Result<(), ArchiveError> {
        Ok(())
    }

    /// First phase of teardown: marks the object pending kill.
    ///
    /// An override that replaces the default must still set
    /// [`ObjectFlags::BEGIN_DESTROYED`].
    fn begin_destroy(&self) {
        self.base().add_flags(ObjectFlags::BEGIN_DESTROYED);
    }

    /// Second phase of teardown, after unregistration.
    ///
    /// An override that replaces the default must still set
    /// [`ObjectFlags::FINISH_DESTROYED`].
    fn finish_destroy(&self) {
        self.base().add_flags(ObjectFlags::FINISH_DESTROYED);
    }
}

impl dyn Object {
    /// Returns `true` if the concrete type is `T`.
    #[must_use]
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to a concrete type.
    #[must_use]
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// A non-owning reference to a live object.
///
/// This is the relation the ownership tree and the identity registry are
/// built from: it never touches the reference counter, so it can never form
/// an ownership cycle. Liveness is a caller invariant: outers outlive their
/// children, and registry entries are unregistered before the final release.
#[derive(Clone, Copy)]
pub struct ObjectRef {
    ptr: NonNull<dyn Object>,
}

impl ObjectRef {
    /// Captures a non-owning reference to a live object.
    #[must_use]
    pub fn of(object: &dyn Object) -> Self {
        Self {
            ptr: NonNull::from(object),
        }
    }

    /// Dereferences the back-reference.
    ///
    /// # Safety
    ///
    /// The referent must still be alive: its reference count must not have
    /// reached zero since this reference was captured.
    #[must_use]
    pub unsafe fn object(&self) -> &dyn Object {
        unsafe { self.ptr.as_ref() }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.ptr.as_ptr(), other.ptr.as_ptr())
    }
}

impl Eq for ObjectRef {}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectRef({:p})", self.ptr.as_ptr())
    }
}
