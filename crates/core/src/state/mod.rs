//! The process-wide application state.
//!
//! [`AppState`] is a persistent value: every `with_*` call returns a new state
//! that shares the untouched fields with the old one, which stays valid for
//! anyone still holding it.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::Value;

use crate::{
    instruments, visualizers, AudioBus, InstrumentSurface, PluginList, Result, SandboxConfig,
    VisualizerSurface,
};

pub type InstrumentList = PluginList<dyn InstrumentSurface>;
pub type VisualizerList = PluginList<dyn VisualizerSurface>;

/// Snapshot of everything shared across the sandbox.
#[derive(Clone, Default)]
pub struct AppState {
    instruments: Option<InstrumentList>,
    visualizers: Option<VisualizerList>,
    settings: Option<Arc<SandboxConfig>>,
    extras: Arc<BTreeMap<String, Value>>,
}

impl AppState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn instruments(&self) -> Option<&InstrumentList> {
        self.instruments.as_ref()
    }

    pub fn visualizers(&self) -> Option<&VisualizerList> {
        self.visualizers.as_ref()
    }

    pub fn settings(&self) -> Option<&Arc<SandboxConfig>> {
        self.settings.as_ref()
    }

    /// Looks up a setting outside the typed fields.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    pub fn with_instruments(&self, instruments: InstrumentList) -> Self {
        Self {
            instruments: Some(instruments),
            ..self.clone()
        }
    }

    pub fn with_visualizers(&self, visualizers: VisualizerList) -> Self {
        Self {
            visualizers: Some(visualizers),
            ..self.clone()
        }
    }

    pub fn with_settings(&self, settings: SandboxConfig) -> Self {
        Self {
            settings: Some(Arc::new(settings)),
            ..self.clone()
        }
    }

    pub fn with_extra(&self, key: impl Into<String>, value: Value) -> Self {
        let mut extras = (*self.extras).clone();
        extras.insert(key.into(), value);
        Self {
            extras: Arc::new(extras),
            ..self.clone()
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("instruments", &self.instruments)
            .field("visualizers", &self.visualizers)
            .field("settings", &self.settings)
            .field("extras", &self.extras)
            .finish()
    }
}

/// Owner of the current [`AppState`]. Transitions swap the whole value.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    current: Arc<AppState>,
    revision: u64,
}

impl StateStore {
    pub fn new(state: AppState) -> Self {
        Self {
            current: Arc::new(state),
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.current.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the current state with `f(current)`.
    pub fn transition<F>(&mut self, f: F) -> Arc<AppState>
    where
        F: FnOnce(&AppState) -> AppState,
    {
        let next = Arc::new(f(&self.current));
        self.current = next.clone();
        self.revision += 1;
        tracing::debug!(revision = self.revision, "state transition");
        next
    }
}

/// Builds the startup state: the default plugin lists plus `config`.
pub fn default_state(config: &SandboxConfig, bus: &AudioBus) -> Result<AppState> {
    let instruments = instruments::defaults(config)?.freeze();
    let visualizers = visualizers::defaults(config, bus.tap())?.freeze();

    Ok(AppState::empty()
        .with_instruments(instruments)
        .with_visualizers(visualizers)
        .with_settings(config.clone()))
}
