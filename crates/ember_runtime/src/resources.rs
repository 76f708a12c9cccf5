//! Resource manager subsystem.
//!
//! A path-keyed cache with loading and unloading left as stubs; concrete
//! resource formats are a future extension layered on top of the object
//! model.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::engine::Subsystem;

/// Caches loaded resources by path.
#[derive(Default)]
pub struct ResourceManager {
    resources: HashMap<String, Arc<dyn Any>>,
}

impl ResourceManager {
    /// Creates a manager with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a resource from a path.
    ///
    /// Always `None` for now.
    // TODO: decode the asset and populate the cache once a loader format lands.
    pub fn load<T: 'static>(&mut self, path: &str) -> Option<Arc<T>> {
        debug!(path, "resource load requested");
        None
    }

    /// Releases a loaded resource.
    pub fn unload<T: 'static>(&mut self, path: &str) {
        self.resources.remove(path);
    }

    /// Number of cached resources.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.resources.len()
    }
}

impl Subsystem for ResourceManager {
    fn initialize(&mut self) {}

    fn update(&mut self, _delta_time: f32) {}

    fn shutdown(&mut self) {
        self.resources.clear();
    }

    fn name(&self) -> &'static str {
        "ResourceManager"
    }
}
