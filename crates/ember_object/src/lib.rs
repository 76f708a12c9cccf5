//! # ember_object
//!
//! The object model of the ember engine: a reference-counted, reflectable
//! object hierarchy with typed identity, ownership paths, and lifecycle
//! hooks.
//!
//! This crate provides:
//!
//! - [`ObjectBase`] / [`Object`] — base state (name, outer, class, flags,
//!   intrusive counter) and the lifecycle-hook contract.
//! - [`Class`] — single-inheritance type descriptors with a factory wired
//!   through an explicit registration table.
//! - [`ObjectRegistry`] — the index from full names and exact types to live
//!   objects.
//! - [`ObjectContext`] — creation/destruction orchestration around a
//!   registry.
//! - [`ObjectPtr`] / [`ObjectRef`] — owning and non-owning handles.
//! - [`serialize_object_ptr`] / [`serialize_object`] — entity references
//!   over archives, resolved by registry full name.
//!
//! ## Ownership protocol
//!
//! Strong ownership flows exclusively through [`ObjectPtr`] and the
//! intrusive counter. The `outer` relation and every registry entry are
//! non-owning [`ObjectRef`]s, which rules out ownership cycles by
//! construction but makes two invariants load-bearing:
//!
//! 1. an object's outers outlive it, and
//! 2. an object is unregistered before its final release (which
//!    [`ObjectContext::destroy_object`] guarantees when creation and
//!    destruction go through the context).
//!
//! Only the reference counter is thread-safe. Handles are `!Send`/`!Sync`,
//! confining the object graph — registries included — to one thread.

pub mod class;
pub mod context;
pub mod flags;
pub mod object;
pub mod ptr;
pub mod registry;
pub mod serialize;

pub use class::{Class, ConstructFn, StaticClass, object_class, register_class,
    registered_class_names};
pub use context::ObjectContext;
pub use flags::ObjectFlags;
pub use object::{Object, ObjectBase, ObjectRef};
pub use ptr::ObjectPtr;
pub use registry::ObjectRegistry;
pub use serialize::{serialize_object, serialize_object_ptr};
