//! The engine: subsystem list and fixed-step loop.
//!
//! The engine is a thin lifecycle wrapper around the object core. It
//! initialises subsystems in registration order, updates them every tick,
//! and shuts them down in reverse order. It reaches the object system only
//! through [`ObjectContext`] entry points: creation, destruction, factory
//! invocation, and archive construction happen in subsystems or client code,
//! never behind their backs.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use ember_object::ObjectContext;

use crate::config::EngineConfig;

/// A unit of engine functionality driven by the fixed-step loop.
pub trait Subsystem {
    /// Runs once before the first update.
    fn initialize(&mut self);

    /// Runs every tick with the elapsed time for this update, in seconds.
    fn update(&mut self, delta_time: f32);

    /// Runs once at shutdown, in reverse registration order.
    fn shutdown(&mut self);

    /// A human-readable subsystem name for logging.
    fn name(&self) -> &'static str;
}

/// Owns the subsystem list, the object context, and the loop state.
pub struct Engine {
    config: EngineConfig,
    subsystems: Vec<Box<dyn Subsystem>>,
    context: ObjectContext,
    initialized: bool,
    running: bool,
    delta_time: f32,
    total_time: f32,
}

impl Engine {
    /// Creates an engine with the given configuration and no subsystems.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            subsystems: Vec::new(),
            context: ObjectContext::new(),
            initialized: false,
            running: false,
            delta_time: 0.0,
            total_time: 0.0,
        }
    }

    /// Registers a subsystem. Initialisation order is registration order.
    pub fn add_subsystem<S: Subsystem + 'static>(&mut self, subsystem: S) {
        self.subsystems.push(Box::new(subsystem));
    }

    /// Returns the object context.
    #[must_use]
    pub fn context(&self) -> &ObjectContext {
        &self.context
    }

    /// Returns the object context mutably.
    pub fn context_mut(&mut self) -> &mut ObjectContext {
        &mut self.context
    }

    /// Returns `true` once `initialize` has run and `shutdown` has not.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Elapsed time of the most recent update, in seconds.
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Accumulated time across all updates, in seconds.
    #[must_use]
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Initialises every subsystem in registration order. Idempotent.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        for subsystem in &mut self.subsystems {
            subsystem.initialize();
            info!(subsystem = subsystem.name(), "subsystem initialised");
        }
        self.initialized = true;
        self.running = true;
    }

    /// Shuts down subsystems in reverse order and clears the list.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.running = false;
        for subsystem in self.subsystems.iter_mut().rev() {
            subsystem.shutdown();
            info!(subsystem = subsystem.name(), "subsystem shut down");
        }
        self.subsystems.clear();
        self.initialized = false;
    }

    /// Runs one update across every subsystem, in order.
    pub fn update(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
        self.total_time += delta_time;
        for subsystem in &mut self.subsystems {
            subsystem.update(delta_time);
        }
    }

    /// Stops the loop after the current tick.
    pub fn request_stop(&mut self) {
        self.running = false;
    }

    /// Drives the fixed-step loop: update at the configured tick rate,
    /// sleeping off any remaining budget, until `max_ticks` is reached (0 =
    /// until stopped). Initialises first if the caller has not.
    pub fn run(&mut self) {
        if !self.initialized {
            self.initialize();
        }

        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let dt = tick_duration.as_secs_f32();
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "engine loop starting"
        );

        while self.running {
            let start = Instant::now();

            self.update(dt);
            tick_count += 1;
            debug!(tick = tick_count, "tick complete");

            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "engine loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick = tick_count,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
