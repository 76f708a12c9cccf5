//! Identity registry — the index from full names and types to live objects.
//!
//! The registry stores non-owning references only. The creation/destruction
//! protocol keeps them from dangling: every registered object is
//! unregistered before its final release. Code that bypasses the protocol
//! and drops every owning handle to a still-registered object leaves a
//! dangling entry behind.
//!
//! The registry is an explicit, constructible value (owned by
//! `ObjectContext`) rather than a hidden process global, so unit tests can
//! run isolated registries side by side. It is not thread-safe; confine a
//! registry to one owning thread.

use std::collections::HashMap;

use tracing::warn;

use crate::class::Class;
use crate::object::{Object, ObjectRef};
use crate::ptr::ObjectPtr;

/// Index of live objects by full name and by exact runtime class.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    /// Full hierarchical name → object.
    by_name: HashMap<String, ObjectRef>,
    /// Class name → objects of exactly that class, in registration order.
    by_class: HashMap<&'static str, Vec<ObjectRef>>,
}

impl ObjectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_class: HashMap::new(),
        }
    }

    /// Registers an object under its current full name and exact class.
    ///
    /// A second registration resolving to the same full name silently
    /// overwrites the first mapping (the collision is logged). The class
    /// collection keeps both objects.
    pub fn register_object(&mut self, object: &dyn Object) {
        let full_name = object.base().full_name();
        let entry = ObjectRef::of(object);

        if let Some(previous) = self.by_name.insert(full_name.clone(), entry)
            && previous != entry
        {
            warn!(name = %full_name, "duplicate full name: overwriting earlier registry entry");
        }

        self.by_class
            .entry(object.base().class().name())
            .or_default()
            .push(entry);
    }

    /// Removes an object's name mapping and its class-collection entry.
    ///
    /// The class collection is searched by identity, so removal is correct
    /// even for aliased names. The name mapping is keyed by the object's
    /// *current* full name; renaming between register and unregister is a
    /// caller hazard.
    pub fn unregister_object(&mut self, object: &dyn Object) {
        let full_name = object.base().full_name();
        self.by_name.remove(&full_name);

        let target = ObjectRef::of(object);
        let class_name = object.base().class().name();
        if let Some(entries) = self.by_class.get_mut(class_name) {
            entries.retain(|entry| *entry != target);
            // Drop the bucket once the last object of the class is gone.
            if entries.is_empty() {
                self.by_class.remove(class_name);
            }
        }
    }

    /// Looks up an object by exact full name, retaining it for the caller.
    #[must_use]
    pub fn find_object(&self, full_name: &str) -> Option<ObjectPtr<dyn Object>> {
        // SAFETY: registry entries are unregistered before their final
        // release (creation/destruction protocol), so stored references are
        // alive.
        self.by_name
            .get(full_name)
            .map(|entry| unsafe { entry.upgrade() })
    }

    /// Returns owning handles to every object of exactly the given class;
    /// subtypes are not included. Empty if none are registered.
    #[must_use]
    pub fn objects_of_class(&self, class: &Class) -> Vec<ObjectPtr<dyn Object>> {
        self.by_class
            .get(class.name())
            .map(|entries| {
                entries
                    .iter()
                    // SAFETY: see `find_object`.
                    .map(|entry| unsafe { entry.upgrade() })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.by_name.len()
    }
}

impl ObjectRef {
    /// Upgrades a registry entry into an owning handle.
    ///
    /// # Safety
    ///
    /// The referent must still be alive when the upgrade happens.
    #[must_use]
    pub unsafe fn upgrade(&self) -> ObjectPtr<dyn Object> {
        // SAFETY: per this function's contract the referent is alive.
        let object = unsafe { self.object() };
        object.base().add_ref();
        ObjectPtr::from_retained(std::ptr::NonNull::from(object))
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::OnceLock;

    use super::*;
    use crate::class::{StaticClass, object_class};
    use crate::object::ObjectBase;

    struct Level {
        base: ObjectBase,
    }

    impl Object for Level {
        fn base(&self) -> &ObjectBase {
            &self.base
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl StaticClass for Level {
        fn static_class() -> &'static Class {
            static CLASS: OnceLock<Class> = OnceLock::new();
            CLASS.get_or_init(|| Class::new("Level", Some(object_class())))
        }
    }

    struct Actor {
        base: ObjectBase,
    }

    impl Object for Actor {
        fn base(&self) -> &ObjectBase {
            &self.base
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl StaticClass for Actor {
        fn static_class() -> &'static Class {
            static CLASS: OnceLock<Class> = OnceLock::new();
            CLASS.get_or_init(|| Class::new("Actor", Some(object_class())))
        }
    }

    fn spawn_level(name: &str) -> ObjectPtr<Level> {
        ObjectPtr::from_box(Box::new(Level {
            base: ObjectBase::new(Level::static_class(), None, name),
        }))
    }

    fn spawn_actor(outer: Option<ObjectRef>, name: &str) -> ObjectPtr<Actor> {
        ObjectPtr::from_box(Box::new(Actor {
            base: ObjectBase::new(Actor::static_class(), outer, name),
        }))
    }

    #[test]
    fn test_register_and_find() {
        let mut registry = ObjectRegistry::new();
        let level = spawn_level("hub");
        let actor = spawn_actor(level.get().map(|o| ObjectRef::of(o)), "door");

        registry.register_object(level.get().unwrap());
        registry.register_object(actor.get().unwrap());
        assert_eq!(registry.object_count(), 2);

        let found = registry.find_object("hub.door").unwrap();
        assert_eq!(found.get().unwrap().base().name(), "door");
        assert!(registry.find_object("hub.window").is_none());

        registry.unregister_object(actor.get().unwrap());
        registry.unregister_object(level.get().unwrap());
    }

    #[test]
    fn test_find_retains_the_object() {
        let mut registry = ObjectRegistry::new();
        let level = spawn_level("retained");
        registry.register_object(level.get().unwrap());

        {
            let found = registry.find_object("retained").unwrap();
            assert_eq!(found.get().unwrap().base().ref_count(), 2);
        }
        assert_eq!(level.get().unwrap().base().ref_count(), 1);

        registry.unregister_object(level.get().unwrap());
    }

    #[test]
    fn test_duplicate_name_overwrites_silently() {
        let mut registry = ObjectRegistry::new();
        let first = spawn_level("arena");
        let second = spawn_actor(None, "arena");

        registry.register_object(first.get().unwrap());
        registry.register_object(second.get().unwrap());

        // One name entry survives: the second registration.
        assert_eq!(registry.object_count(), 1);
        let found = registry.find_object("arena").unwrap();
        assert!(found.get().unwrap().is::<Actor>());

        // Both objects still appear in their own class collections.
        assert_eq!(registry.objects_of_class(Level::static_class()).len(), 1);
        assert_eq!(registry.objects_of_class(Actor::static_class()).len(), 1);

        registry.unregister_object(second.get().unwrap());
        registry.unregister_object(first.get().unwrap());
    }

    #[test]
    fn test_objects_of_class_is_exact() {
        let mut registry = ObjectRegistry::new();
        let level = spawn_level("map");
        let actor = spawn_actor(None, "npc");

        registry.register_object(level.get().unwrap());
        registry.register_object(actor.get().unwrap());

        let levels = registry.objects_of_class(Level::static_class());
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].get().unwrap().base().name(), "map");
        // The shared super-class does not aggregate subtypes.
        assert!(registry.objects_of_class(object_class()).is_empty());

        registry.unregister_object(level.get().unwrap());
        registry.unregister_object(actor.get().unwrap());
    }

    #[test]
    fn test_unregister_removes_by_identity() {
        let mut registry = ObjectRegistry::new();
        let a = spawn_actor(None, "a");
        let b = spawn_actor(None, "b");

        registry.register_object(a.get().unwrap());
        registry.register_object(b.get().unwrap());

        // Rename after registration, then unregister: the class collection
        // still drops the right object because it matches identity.
        b.get().unwrap().base().set_name("renamed");
        registry.unregister_object(b.get().unwrap());

        let remaining = registry.objects_of_class(Actor::static_class());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].get().unwrap().base().name(), "a");

        registry.unregister_object(a.get().unwrap());
    }
}
