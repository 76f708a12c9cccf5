//! Runtime type descriptors and the class factory table.
//!
//! A [`Class`] names a type and links to its single super-type, forming a
//! finite, acyclic inheritance chain. One `Class` value serves every
//! instance of its type and conventionally lives for the whole process,
//! exposed through [`StaticClass::static_class`].
//!
//! Factories are wired through an explicit process-wide registration table:
//! each concrete type registers a constructor function at startup with
//! [`register_class`], and [`Class::instantiate`] queries the table by its
//! own name. A type with no registered constructor produces nothing, which
//! is the base-class behaviour.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::object::{Object, ObjectBase, ObjectRef};
use crate::ptr::ObjectPtr;

/// Builds a concrete object around prepared base state.
///
/// A plain function pointer keeps the table inspectable: constructors carry
/// no captured state, all per-instance data comes from the [`ObjectBase`].
pub type ConstructFn = fn(ObjectBase) -> Box<dyn Object>;

/// A runtime type descriptor: a name, an optional super-type, and an
/// optional property list. Immutable after construction.
#[derive(Debug)]
pub struct Class {
    name: &'static str,
    super_class: Option<&'static Class>,
    properties: &'static [&'static str],
}

impl Class {
    /// Creates a descriptor with no properties.
    #[must_use]
    pub const fn new(name: &'static str, super_class: Option<&'static Class>) -> Self {
        Self {
            name,
            super_class,
            properties: &[],
        }
    }

    /// Creates a descriptor carrying a property-name list.
    ///
    /// The list is a reflection placeholder consumed by editor and tooling
    /// code; property storage itself is not modelled yet.
    #[must_use]
    pub const fn with_properties(
        name: &'static str,
        super_class: Option<&'static Class>,
        properties: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            super_class,
            properties,
        }
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the super-type, if any.
    #[must_use]
    pub fn super_class(&self) -> Option<&'static Class> {
        self.super_class
    }

    /// Returns the declared property names. Empty unless the class supplied
    /// a list.
    #[must_use]
    pub fn property_names(&self) -> &'static [&'static str] {
        self.properties
    }

    /// Returns `true` if the class declares the named property.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(&name)
    }

    /// Constructs an unregistered instance of this type.
    ///
    /// Returns `None` when no constructor is registered for the type; the
    /// caller sees the same absent result the abstract base class produces.
    /// Most code should go through `ObjectContext::create_object`, which
    /// also registers the instance and runs its initialisation hook.
    #[must_use]
    pub fn instantiate(
        &'static self,
        outer: Option<ObjectRef>,
        name: impl Into<String>,
    ) -> Option<ObjectPtr<dyn Object>> {
        let construct = constructor_for(self.name)?;
        let base = ObjectBase::new(self, outer, name);
        Some(ObjectPtr::from_box(construct(base)))
    }
}

/// The root type descriptor every inheritance chain terminates in.
#[must_use]
pub fn object_class() -> &'static Class {
    static OBJECT: Class = Class::new("Object", None);
    &OBJECT
}

/// A type with a process-lifetime [`Class`] singleton.
pub trait StaticClass: Object + Sized {
    /// Returns the shared descriptor for this type.
    fn static_class() -> &'static Class;
}

fn constructors() -> &'static Mutex<HashMap<&'static str, ConstructFn>> {
    static TABLE: OnceLock<Mutex<HashMap<&'static str, ConstructFn>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers the constructor for a concrete type, keyed by its class name.
///
/// Intended to run once per type at startup; registering again simply
/// replaces the entry.
pub fn register_class<T: StaticClass>(construct: ConstructFn) {
    let class = T::static_class();
    constructors()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(class.name(), construct);
    debug!(class = class.name(), "class constructor registered");
}

/// Returns the names of every class with a registered constructor, sorted.
#[must_use]
pub fn registered_class_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = constructors()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .copied()
        .collect();
    names.sort_unstable();
    names
}

fn constructor_for(name: &str) -> Option<ConstructFn> {
    constructors()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .copied()
}
