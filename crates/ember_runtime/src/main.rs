//! # ember_demo
//!
//! A small end-to-end drive of the engine: registers an object class,
//! creates an ownership hierarchy through the context, ticks it under the
//! fixed-step loop, and round-trips object state and references through
//! memory and file archives.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::sync::OnceLock;

use anyhow::{Context as _, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ember_archive::{Archive, ArchiveError, FileArchive, MemoryArchive, Persist};
use ember_object::{
    Class, Object, ObjectBase, ObjectPtr, ObjectRef, StaticClass, object_class, register_class,
    serialize_object_ptr,
};
use ember_runtime::{Engine, EngineConfig, ResourceManager, Subsystem, TimeSubsystem};

/// A beacon accumulates intensity while ticking and records one sample per
/// update. One serialisation routine covers both archive directions.
struct Beacon {
    base: ObjectBase,
    intensity: Cell<f32>,
    samples: RefCell<Vec<f32>>,
}

impl Object for Beacon {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn tick(&self, delta_time: f32) {
        let next = self.intensity.get() + delta_time;
        self.intensity.set(next);
        self.samples.borrow_mut().push(next);
    }

    fn serialize(&self, archive: &mut dyn Archive) -> Result<(), ArchiveError> {
        let mut intensity = self.intensity.get();
        archive.serialize_f32(&mut intensity)?;
        self.intensity.set(intensity);

        self.samples.borrow_mut().persist(archive)
    }
}

impl StaticClass for Beacon {
    fn static_class() -> &'static Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        CLASS.get_or_init(|| Class::new("Beacon", Some(object_class())))
    }
}

/// Ticks every beacon it owns once per engine update.
struct BeaconSubsystem {
    beacons: Vec<ObjectPtr<Beacon>>,
}

impl Subsystem for BeaconSubsystem {
    fn initialize(&mut self) {
        for beacon in &self.beacons {
            if let Some(object) = beacon.get() {
                object.begin_play();
            }
        }
    }

    fn update(&mut self, delta_time: f32) {
        for beacon in &self.beacons {
            if let Some(object) = beacon.get() {
                object.tick(delta_time);
            }
        }
    }

    fn shutdown(&mut self) {
        for beacon in &self.beacons {
            if let Some(object) = beacon.get() {
                object.end_play();
            }
        }
        self.beacons.clear();
    }

    fn name(&self) -> &'static str {
        "BeaconSubsystem"
    }
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ember_demo=info".parse()?))
        .init();

    register_class::<Beacon>(|base| {
        Box::new(Beacon {
            base,
            intensity: Cell::new(0.0),
            samples: RefCell::new(Vec::new()),
        })
    });

    let config = EngineConfig {
        tick_rate: 120.0,
        max_ticks: 6,
    };
    let mut engine = Engine::new(config);
    engine.add_subsystem(TimeSubsystem::new());
    engine.add_subsystem(ResourceManager::new());

    // Build a small ownership hierarchy through the context.
    let lighthouse = engine
        .context_mut()
        .create::<Beacon>(None, "lighthouse")
        .context("Beacon class not registered")?;
    let lamp_outer = lighthouse.get().map(|object| ObjectRef::of(object));
    let lamp = engine
        .context_mut()
        .create::<Beacon>(lamp_outer, "lamp")
        .context("Beacon class not registered")?;

    info!(
        full_name = %lamp.get().map(|o| o.base().full_name()).unwrap_or_default(),
        registered = engine.context().registry().object_count(),
        "scene created"
    );

    engine.add_subsystem(BeaconSubsystem {
        beacons: vec![lighthouse.clone(), lamp.clone()],
    });
    engine.run();

    // Save the lamp's state plus a reference to its outer.
    let mut writer = MemoryArchive::writer();
    if let Some(object) = lamp.get() {
        object.serialize(&mut writer)?;
    }
    let mut link = lighthouse.to_dyn();
    serialize_object_ptr(&mut writer, engine.context().registry(), &mut link)?;
    let saved = writer.into_bytes();
    info!(bytes = saved.len(), "scene saved to memory archive");

    // Persist the same bytes to disk and read them back.
    let save_path = std::env::temp_dir().join("ember_demo_save.bin");
    {
        let mut file = FileArchive::create(&save_path)?;
        let mut copy = saved.clone();
        file.serialize_bytes(&mut copy)?;
    }

    // Disturb the lamp, then restore it from the saved stream.
    if let Some(object) = lamp.get() {
        object.intensity.set(0.0);
        object.samples.borrow_mut().clear();
    }
    let mut reader = MemoryArchive::reader(saved);
    if let Some(object) = lamp.get() {
        object.serialize(&mut reader)?;
    }
    let mut restored_link: ObjectPtr<dyn Object> = ObjectPtr::null();
    serialize_object_ptr(&mut reader, engine.context().registry(), &mut restored_link)?;

    info!(
        intensity = lamp.get().map(|o| o.intensity.get()).unwrap_or_default(),
        samples = lamp.get().map(|o| o.samples.borrow().len()).unwrap_or_default(),
        link_resolved = restored_link.is_valid(),
        "scene restored"
    );

    // Tear down: children before outers, then the engine.
    engine.context_mut().destroy_object(lamp.to_dyn());
    engine.context_mut().destroy_object(lighthouse.to_dyn());
    drop(restored_link);
    drop(lamp);
    drop(lighthouse);
    engine.shutdown();

    std::fs::remove_file(&save_path).ok();
    Ok(())
}
