//! Object creation and destruction orchestration.
//!
//! An [`ObjectContext`] owns an identity registry and drives the lifecycle
//! protocol around it:
//!
//! 1. creation: factory construction, registration, then the
//!    `post_init_properties` hook, before the owning handle reaches the
//!    caller;
//! 2. destruction: `begin_destroy`, unregistration, `finish_destroy`, then
//!    release of the creator's implicit reference. Storage is reclaimed when
//!    the counter hits zero, which other owners may defer arbitrarily.
//!
//! Contexts are plain values: tests build as many isolated ones as they
//! need. A context is not thread-safe and must stay on its owning thread.

use tracing::debug;

use crate::class::{Class, StaticClass};
use crate::object::{Object, ObjectRef};
use crate::ptr::ObjectPtr;
use crate::registry::ObjectRegistry;

/// Owns an [`ObjectRegistry`] and applies the lifecycle protocol.
#[derive(Debug, Default)]
pub struct ObjectContext {
    registry: ObjectRegistry,
    anonymous_counter: u64,
}

impl ObjectContext {
    /// Creates a context with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ObjectRegistry::new(),
            anonymous_counter: 0,
        }
    }

    /// Returns the identity registry.
    #[must_use]
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Creates, registers, and initialises an object of the given class.
    ///
    /// An empty `name` requests a generated one (`"{Class}_{n}"`, unique per
    /// context), since the registry is keyed by full name. Returns `None`
    /// when the class has no registered constructor; nothing is registered
    /// in that case.
    pub fn create_object(
        &mut self,
        class: &'static Class,
        outer: Option<ObjectRef>,
        name: &str,
    ) -> Option<ObjectPtr<dyn Object>> {
        let name = if name.is_empty() {
            self.generate_name(class)
        } else {
            name.to_string()
        };

        let handle = class.instantiate(outer, name)?;
        let object = handle.get()?;
        self.registry.register_object(object);
        object.post_init_properties();
        debug!(
            class = class.name(),
            name = %object.base().full_name(),
            "object created"
        );
        Some(handle)
    }

    /// Typed convenience over [`ObjectContext::create_object`].
    pub fn create<T: StaticClass>(
        &mut self,
        outer: Option<ObjectRef>,
        name: &str,
    ) -> Option<ObjectPtr<T>> {
        self.create_object(T::static_class(), outer, name)?
            .downcast::<T>()
    }

    /// Runs the two-phase teardown and releases the creator's reference.
    ///
    /// A null handle is a no-op. Other owning handles keep the storage alive
    /// past this call; only the registry entry and the implicit reference
    /// are gone.
    pub fn destroy_object(&mut self, handle: ObjectPtr<dyn Object>) {
        let Some(object) = handle.get() else {
            return;
        };
        object.begin_destroy();
        self.registry.unregister_object(object);
        object.finish_destroy();
        debug!(name = %object.base().name(), "object destroyed");
        // `handle` drops here: the creator's implicit reference is released.
    }

    /// Looks up a registered object by exact full name.
    #[must_use]
    pub fn find_object(&self, full_name: &str) -> Option<ObjectPtr<dyn Object>> {
        self.registry.find_object(full_name)
    }

    fn generate_name(&mut self, class: &Class) -> String {
        let n = self.anonymous_counter;
        self.anonymous_counter += 1;
        format!("{}_{}", class.name(), n)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::Cell;
    use std::sync::OnceLock;

    use super::*;
    use crate::class::{object_class, register_class};
    use crate::flags::ObjectFlags;
    use crate::object::ObjectBase;

    struct Ghost {
        base: ObjectBase,
        ticked: Cell<f32>,
    }

    impl Object for Ghost {
        fn base(&self) -> &ObjectBase {
            &self.base
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn tick(&self, delta_time: f32) {
            self.ticked.set(self.ticked.get() + delta_time);
        }
    }

    impl StaticClass for Ghost {
        fn static_class() -> &'static Class {
            static CLASS: OnceLock<Class> = OnceLock::new();
            CLASS.get_or_init(|| Class::new("Ghost", Some(object_class())))
        }
    }

    fn register_ghost() {
        register_class::<Ghost>(|base| {
            Box::new(Ghost {
                base,
                ticked: Cell::new(0.0),
            })
        });
    }

    #[test]
    fn test_create_registers_and_initialises() {
        register_ghost();
        let mut context = ObjectContext::new();

        let ghost = context.create::<Ghost>(None, "spectre").unwrap();
        let base = ghost.get().unwrap().base();
        assert!(!base.has_flags(ObjectFlags::NEED_INITIALIZATION));
        assert!(base.has_flags(ObjectFlags::INITIALIZED_PROPS));
        assert_eq!(context.registry().object_count(), 1);
        assert!(context.find_object("spectre").is_some());
    }

    #[test]
    fn test_create_unknown_class_is_none() {
        let mut context = ObjectContext::new();
        // The root class has no constructor; nothing must be registered.
        assert!(context.create_object(object_class(), None, "nothing").is_none());
        assert_eq!(context.registry().object_count(), 0);
    }

    #[test]
    fn test_anonymous_names_are_unique() {
        register_ghost();
        let mut context = ObjectContext::new();

        let first = context.create::<Ghost>(None, "").unwrap();
        let second = context.create::<Ghost>(None, "").unwrap();
        let name_a = first.get().unwrap().base().name();
        let name_b = second.get().unwrap().base().name();
        assert_ne!(name_a, name_b);
        assert!(name_a.starts_with("Ghost_"));
        assert_eq!(context.registry().object_count(), 2);
    }

    #[test]
    fn test_destroy_runs_two_phase_teardown() {
        register_ghost();
        let mut context = ObjectContext::new();

        let ghost = context.create::<Ghost>(None, "doomed").unwrap();
        let keeper = ghost.clone();

        context.destroy_object(ghost.to_dyn());
        // `ghost` still holds a reference of its own.
        drop(ghost);

        let base = keeper.get().unwrap().base();
        assert!(base.has_flags(ObjectFlags::BEGIN_DESTROYED));
        assert!(base.has_flags(ObjectFlags::FINISH_DESTROYED));
        assert!(base.is_pending_kill());
        assert!(context.find_object("doomed").is_none());
        assert_eq!(context.registry().object_count(), 0);
        // Destroyed-but-referenced: the handle stays usable until released.
        assert_eq!(base.ref_count(), 1);
    }

    #[test]
    fn test_destroy_null_handle_is_a_no_op() {
        let mut context = ObjectContext::new();
        context.destroy_object(ObjectPtr::null());
        assert_eq!(context.registry().object_count(), 0);
    }

    #[test]
    fn test_outer_chain_through_context() {
        register_ghost();
        let mut context = ObjectContext::new();

        let parent = context.create::<Ghost>(None, "house").unwrap();
        let parent_ref = parent.get().map(|o| ObjectRef::of(o));
        let child = context.create::<Ghost>(parent_ref, "attic").unwrap();

        assert_eq!(child.get().unwrap().base().full_name(), "house.attic");
        assert!(context.find_object("house.attic").is_some());
        assert!(context.find_object("attic").is_none());

        // Children must be torn down before their outers.
        context.destroy_object(child.to_dyn());
        context.destroy_object(parent.to_dyn());
        drop(child);
        drop(parent);
    }

    #[test]
    fn test_ticking_through_handles() {
        register_ghost();
        let mut context = ObjectContext::new();

        let ghost = context.create::<Ghost>(None, "mover").unwrap();
        ghost.get().unwrap().tick(0.25);
        ghost.get().unwrap().tick(0.25);
        assert_eq!(ghost.get().unwrap().ticked.get(), 0.5);
    }
}
