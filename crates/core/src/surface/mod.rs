//! Capability contracts for pluggable surfaces.
//!
//! Instruments render with access to their synth slot and react to input;
//! visualizers take no props and observe whatever signal they were built
//! around.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineConfig, EngineFactory, EngineGuard, Note, Result, SynthSlot};

/// Props handed to an instrument surface: the current synth and the means to
/// replace it.
pub struct InstrumentProps<'a> {
    slot: &'a mut SynthSlot,
    engines: &'a dyn EngineFactory,
}

impl<'a> InstrumentProps<'a> {
    pub fn new(slot: &'a mut SynthSlot, engines: &'a dyn EngineFactory) -> Self {
        Self { slot, engines }
    }

    pub fn synth(&self) -> Option<&EngineGuard> {
        self.slot.synth()
    }

    pub fn synth_mut(&mut self) -> Option<&mut EngineGuard> {
        self.slot.synth_mut()
    }

    /// The only way a surface may change its synth. See [`SynthSlot::replace`].
    pub fn set_synth<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(Option<EngineGuard>) -> Result<Option<EngineGuard>>,
    {
        self.slot.replace(updater)
    }

    /// Releases the current synth, then builds one from `config`.
    pub fn rebuild_synth(&mut self, config: &EngineConfig) -> Result<()> {
        self.slot.rebuild(self.engines, config)
    }

    pub fn engines(&self) -> &'a dyn EngineFactory {
        self.engines
    }
}

/// Contract every instrument surface implements.
pub trait InstrumentSurface {
    /// Engine the host builds into a fresh slot when this surface mounts.
    fn initial_engine(&self) -> EngineConfig {
        EngineConfig::default()
    }

    fn render(&self, props: &InstrumentProps<'_>) -> SurfaceView;

    fn handle(&self, input: &SurfaceInput, props: &mut InstrumentProps<'_>) -> Result<()>;
}

/// Contract every visualizer surface implements.
pub trait VisualizerSurface {
    fn render(&self) -> Result<SurfaceView>;
}

/// User interaction routed to the mounted instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SurfaceInput {
    Press(Note),
    Release(Note),
    /// Picks a named option, such as an oscillator type.
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Key {
        note: Note,
        minor: bool,
        /// Horizontal position in white-key widths.
        offset: f32,
    },
    Toggle {
        label: String,
        active: bool,
    },
    Meter {
        label: String,
        value: f32,
    },
    Trace {
        label: String,
        points: Vec<f32>,
    },
}

/// What a surface produced for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceView {
    pub title: String,
    pub widgets: Vec<Widget>,
}

impl SurfaceView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            widgets: Vec::new(),
        }
    }

    pub fn push(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }

    pub fn keys(&self) -> impl Iterator<Item = (&Note, bool)> {
        self.widgets.iter().filter_map(|widget| match widget {
            Widget::Key { note, minor, .. } => Some((note, *minor)),
            _ => None,
        })
    }

    /// Label of the first active toggle, if any.
    pub fn active_toggle(&self) -> Option<&str> {
        self.widgets.iter().find_map(|widget| match widget {
            Widget::Toggle {
                label,
                active: true,
            } => Some(label.as_str()),
            _ => None,
        })
    }

    pub fn meter(&self, label: &str) -> Option<f32> {
        self.widgets.iter().find_map(|widget| match widget {
            Widget::Meter { label: l, value } if l == label => Some(*value),
            _ => None,
        })
    }
}

impl fmt::Display for SurfaceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.title)?;

        let keys: Vec<String> = self
            .keys()
            .map(|(note, minor)| {
                if minor {
                    format!("({note})")
                } else {
                    note.to_string()
                }
            })
            .collect();
        if !keys.is_empty() {
            writeln!(f, "  keys: {}", keys.join(" "))?;
        }

        for widget in &self.widgets {
            match widget {
                Widget::Key { .. } => {}
                Widget::Toggle { label, active } => {
                    writeln!(f, "  {} {label}", if *active { "[x]" } else { "[ ]" })?
                }
                Widget::Meter { label, value } => writeln!(f, "  {label:<12} {value:.3}")?,
                Widget::Trace { label, points } => {
                    writeln!(f, "  {label:<12} {}", sparkline(points))?
                }
            }
        }
        Ok(())
    }
}

/// Coarse text rendering of a signal in [-1, 1].
fn sparkline(points: &[f32]) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    const WIDTH: usize = 64;

    if points.is_empty() {
        return "(silent)".to_string();
    }

    let stride = points.len().div_ceil(WIDTH);
    points
        .chunks(stride)
        .map(|chunk| {
            let peak = chunk.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
            let level = (peak.clamp(0.0, 1.0) * (LEVELS.len() - 1) as f32).round() as usize;
            LEVELS[level]
        })
        .collect()
}
