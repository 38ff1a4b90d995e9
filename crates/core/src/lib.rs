//! Core library for the Music Sandbox.
//!
//! Instruments and visualizers are plugins: named descriptors wrapping a
//! surface that implements [`InstrumentSurface`] or [`VisualizerSurface`].
//! Registered plugin lists live in a persistent [`AppState`]; the
//! [`CompositionRoot`] mounts the selected entries and owns the mounted
//! instrument's [`SynthSlot`]. Sound engines are collaborators reached through
//! [`SoundEngine`] and [`EngineFactory`].

pub mod analysis;
pub mod audio;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod instruments;
pub mod note;
pub mod registry;
pub mod root;
pub mod slot;
pub mod state;
pub mod surface;
pub mod visualizers;

pub use analysis::{SignalAnalyzer, SpectrumSnapshot};
pub use audio::{AudioBus, BusTap, ConnectionId};
pub use config::{AudioConfig, SandboxConfig, VisualConfig};
pub use descriptor::{Descriptor, InstrumentDescriptor, VisualizerDescriptor};
pub use engine::{
    BusEngineFactory, EngineConfig, EngineFactory, OscillatorKind, OscillatorSynth, Sampler,
    SamplerConfig, SoundEngine,
};
pub use error::{Result, SandboxError};
pub use note::Note;
pub use registry::{PluginKind, PluginList, Registry};
pub use root::{Chooser, CompositionRoot, Frame, Selection};
pub use slot::{EngineGuard, SynthSlot};
pub use state::{default_state, AppState, InstrumentList, StateStore, VisualizerList};
pub use surface::{
    InstrumentProps, InstrumentSurface, SurfaceInput, SurfaceView, VisualizerSurface, Widget,
};
