//! The synth handle slot owned by a mounted instrument.
//!
//! An engine only ever lives inside an [`EngineGuard`], which releases the
//! engine's output routing exactly once: explicitly through
//! [`EngineGuard::release`] or, failing that, when the guard is dropped.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{EngineConfig, EngineFactory, Result, SoundEngine};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Scoped ownership of one engine instance.
pub struct EngineGuard {
    instance: u64,
    engine: Box<dyn SoundEngine>,
    released: bool,
}

impl EngineGuard {
    pub fn new(engine: Box<dyn SoundEngine>) -> Self {
        Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            engine,
            released: false,
        }
    }

    /// Process-unique id of the guarded engine.
    pub fn instance_id(&self) -> u64 {
        self.instance
    }

    /// Disconnects the engine now, surfacing any failure to the caller.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        tracing::debug!(instance = self.instance, "releasing sound engine");
        self.engine.disconnect()
    }
}

impl Deref for EngineGuard {
    type Target = dyn SoundEngine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref()
    }
}

impl DerefMut for EngineGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine.as_mut()
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        tracing::debug!(instance = self.instance, "releasing dropped sound engine");
        if let Err(err) = self.engine.disconnect() {
            tracing::warn!(instance = self.instance, %err, "failed to release sound engine");
        }
    }
}

impl fmt::Debug for EngineGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineGuard")
            .field("instance", &self.instance)
            .field("config", self.engine.config())
            .field("released", &self.released)
            .finish()
    }
}

/// Holds at most one engine for a mounted instrument surface.
#[derive(Debug, Default)]
pub struct SynthSlot {
    current: Option<EngineGuard>,
    generation: u64,
}

impl SynthSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: EngineGuard) -> Self {
        Self {
            current: Some(engine),
            generation: 0,
        }
    }

    /// The current engine, if one has been set.
    pub fn synth(&self) -> Option<&EngineGuard> {
        self.current.as_ref()
    }

    pub fn synth_mut(&mut self) -> Option<&mut EngineGuard> {
        self.current.as_mut()
    }

    /// Bumped on every replacement so dependents know to re-render.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the current engine with whatever `updater` returns.
    ///
    /// The updater takes ownership of the previous engine. It should release
    /// it before building the next one; anything it drops is released anyway.
    /// If the updater fails the slot is left empty and the error is returned
    /// unchanged.
    pub fn replace<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(Option<EngineGuard>) -> Result<Option<EngineGuard>>,
    {
        let previous = self.current.take();
        self.generation += 1;
        self.current = updater(previous)?;
        tracing::debug!(
            generation = self.generation,
            instance = ?self.current.as_ref().map(EngineGuard::instance_id),
            "replaced synth"
        );
        Ok(())
    }

    /// Releases the current engine and builds a new one from `config`.
    pub fn rebuild(&mut self, engines: &dyn EngineFactory, config: &EngineConfig) -> Result<()> {
        self.replace(|previous| {
            if let Some(previous) = previous {
                previous.release()?;
            }
            let engine = engines.create(config)?;
            Ok(Some(EngineGuard::new(engine)))
        })
    }

    /// Empties the slot, releasing any held engine.
    pub fn clear(&mut self) -> Result<()> {
        self.replace(|previous| {
            if let Some(previous) = previous {
                previous.release()?;
            }
            Ok(None)
        })
    }
}
