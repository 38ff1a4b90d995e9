//! Composition root: picks the active instrument and visualizer out of the
//! application state and owns the mounted instrument's synth slot.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    AppState, Descriptor, EngineFactory, InstrumentDescriptor, InstrumentProps, Result,
    SandboxError, StateStore, SurfaceInput, SurfaceView, SynthSlot, VisualizerDescriptor,
};

/// Which entry of each list is active. Local to the root, never stored in
/// [`AppState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub instrument: usize,
    pub visualizer: usize,
}

/// A selector over one plugin list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chooser {
    pub options: Vec<String>,
    pub active: Option<usize>,
}

impl Chooser {
    fn over<S: ?Sized>(list: Option<&Arc<[Descriptor<S>]>>, active: Option<usize>) -> Self {
        Self {
            options: list
                .map(|list| list.iter().map(|d| d.name().to_string()).collect())
                .unwrap_or_default(),
            active,
        }
    }
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub instruments: Chooser,
    pub visualizers: Chooser,
    pub instrument: Option<SurfaceView>,
    pub visualizer: Option<SurfaceView>,
}

struct MountedInstrument {
    index: usize,
    descriptor: InstrumentDescriptor,
    slot: SynthSlot,
}

struct MountedVisualizer {
    index: usize,
    descriptor: VisualizerDescriptor,
}

pub struct CompositionRoot {
    store: StateStore,
    engines: Arc<dyn EngineFactory>,
    selection: Selection,
    instrument: Option<MountedInstrument>,
    visualizer: Option<MountedVisualizer>,
}

impl CompositionRoot {
    /// Mounts the first instrument and visualizer, if any are registered.
    pub fn new(state: AppState, engines: Arc<dyn EngineFactory>) -> Result<Self> {
        let mut root = Self {
            store: StateStore::new(state),
            engines,
            selection: Selection::default(),
            instrument: None,
            visualizer: None,
        };
        root.reconcile()?;
        Ok(root)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn state(&self) -> Arc<AppState> {
        self.store.snapshot()
    }

    /// Synth slot of the mounted instrument.
    pub fn synth(&self) -> Option<&SynthSlot> {
        self.instrument.as_ref().map(|mounted| &mounted.slot)
    }

    pub fn select_instrument(&mut self, index: usize) -> Result<()> {
        let state = self.store.snapshot();
        let len = state.instruments().map_or(0, |list| list.len());
        if index >= len {
            return Err(SandboxError::UnknownSelection {
                kind: "instrument",
                index,
                len,
            });
        }
        if self.selection.instrument == index && self.instrument.is_some() {
            return Ok(());
        }

        self.selection.instrument = index;
        self.reconcile()
    }

    pub fn select_visualizer(&mut self, index: usize) -> Result<()> {
        let state = self.store.snapshot();
        let len = state.visualizers().map_or(0, |list| list.len());
        if index >= len {
            return Err(SandboxError::UnknownSelection {
                kind: "visualizer",
                index,
                len,
            });
        }

        self.selection.visualizer = index;
        self.reconcile()
    }

    pub fn select_instrument_by_name(&mut self, name: &str) -> Result<()> {
        let index = position(self.store.snapshot().instruments(), name).ok_or_else(|| {
            SandboxError::UnknownPlugin {
                kind: "instrument",
                name: name.to_string(),
            }
        })?;
        self.select_instrument(index)
    }

    pub fn select_visualizer_by_name(&mut self, name: &str) -> Result<()> {
        let index = position(self.store.snapshot().visualizers(), name).ok_or_else(|| {
            SandboxError::UnknownPlugin {
                kind: "visualizer",
                name: name.to_string(),
            }
        })?;
        self.select_visualizer(index)
    }

    /// Routes input to the mounted instrument. Ignored when nothing is
    /// mounted.
    pub fn dispatch(&mut self, input: &SurfaceInput) -> Result<()> {
        let Some(mounted) = self.instrument.as_mut() else {
            tracing::debug!(?input, "no instrument mounted");
            return Ok(());
        };
        let mut props = InstrumentProps::new(&mut mounted.slot, self.engines.as_ref());
        mounted.descriptor.surface().handle(input, &mut props)
    }

    /// Replaces the application state and remounts whatever it invalidated.
    pub fn transition<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&AppState) -> AppState,
    {
        self.store.transition(f);
        self.reconcile()
    }

    pub fn render(&mut self) -> Result<Frame> {
        let state = self.store.snapshot();

        let instrument = match self.instrument.as_mut() {
            Some(mounted) => {
                let props = InstrumentProps::new(&mut mounted.slot, self.engines.as_ref());
                Some(mounted.descriptor.surface().render(&props))
            }
            None => None,
        };
        let visualizer = match &self.visualizer {
            Some(mounted) => Some(mounted.descriptor.surface().render()?),
            None => None,
        };

        Ok(Frame {
            instruments: Chooser::over(
                state.instruments(),
                self.instrument.as_ref().map(|m| m.index),
            ),
            visualizers: Chooser::over(
                state.visualizers(),
                self.visualizer.as_ref().map(|m| m.index),
            ),
            instrument,
            visualizer,
        })
    }

    /// Brings the mounted surfaces in line with the selection and state.
    ///
    /// The visualizer goes first: swapping it cannot fail, so a failed
    /// instrument mount never leaves it pointing into the previous state.
    fn reconcile(&mut self) -> Result<()> {
        let state = self.store.snapshot();
        self.reconcile_visualizer(&state);
        self.reconcile_instrument(&state)
    }

    fn reconcile_instrument(&mut self, state: &AppState) -> Result<()> {
        let wanted = pick(state.instruments(), &mut self.selection.instrument);
        let stale = match (&self.instrument, &wanted) {
            (Some(mounted), Some(next)) => {
                mounted.index != self.selection.instrument || !mounted.descriptor.same_surface(next)
            }
            (None, None) => false,
            _ => true,
        };
        if stale {
            self.unmount_instrument()?;
            if let Some(descriptor) = wanted {
                self.mount_instrument(self.selection.instrument, descriptor)?;
            }
        }
        Ok(())
    }

    fn reconcile_visualizer(&mut self, state: &AppState) {
        let wanted = pick(state.visualizers(), &mut self.selection.visualizer);
        let stale = match (&self.visualizer, &wanted) {
            (Some(mounted), Some(next)) => {
                mounted.index != self.selection.visualizer || !mounted.descriptor.same_surface(next)
            }
            (None, None) => false,
            _ => true,
        };
        if !stale {
            return;
        }
        if let Some(previous) = self.visualizer.take() {
            tracing::debug!(name = previous.descriptor.name(), "unmounted visualizer");
        }
        self.visualizer = wanted.map(|descriptor| {
            tracing::debug!(name = descriptor.name(), "mounted visualizer");
            MountedVisualizer {
                index: self.selection.visualizer,
                descriptor,
            }
        });
    }

    fn mount_instrument(&mut self, index: usize, descriptor: InstrumentDescriptor) -> Result<()> {
        let mut slot = SynthSlot::new();
        slot.rebuild(self.engines.as_ref(), &descriptor.surface().initial_engine())?;
        tracing::debug!(name = descriptor.name(), index, "mounted instrument");
        self.instrument = Some(MountedInstrument {
            index,
            descriptor,
            slot,
        });
        Ok(())
    }

    fn unmount_instrument(&mut self) -> Result<()> {
        if let Some(mut mounted) = self.instrument.take() {
            tracing::debug!(name = mounted.descriptor.name(), "unmounting instrument");
            mounted.slot.clear()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CompositionRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionRoot")
            .field("selection", &self.selection)
            .field(
                "instrument",
                &self.instrument.as_ref().map(|m| m.descriptor.name()),
            )
            .field(
                "visualizer",
                &self.visualizer.as_ref().map(|m| m.descriptor.name()),
            )
            .finish()
    }
}

/// Descriptor at `*index`, resetting the index to 0 when it fell off the end.
fn pick<S: ?Sized>(list: Option<&Arc<[Descriptor<S>]>>, index: &mut usize) -> Option<Descriptor<S>> {
    let list = list?;
    if *index >= list.len() {
        *index = 0;
    }
    list.get(*index).cloned()
}

fn position<S: ?Sized>(list: Option<&Arc<[Descriptor<S>]>>, name: &str) -> Option<usize> {
    list?.iter().position(|d| d.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        default_state, slot::tests::RecordingFactory, AudioBus, BusEngineFactory,
        InstrumentSurface, Registry, SandboxConfig, SurfaceView, VisualizerSurface,
    };

    struct Keys(&'static str);

    impl InstrumentSurface for Keys {
        fn render(&self, props: &InstrumentProps<'_>) -> SurfaceView {
            let mut view = SurfaceView::new(self.0);
            if props.synth().is_some() {
                view.push(crate::Widget::Toggle {
                    label: "armed".into(),
                    active: true,
                });
            }
            view
        }

        fn handle(&self, input: &SurfaceInput, props: &mut InstrumentProps<'_>) -> Result<()> {
            if let (SurfaceInput::Press(note), Some(synth)) = (input, props.synth_mut()) {
                synth.trigger_attack(*note)?;
            }
            Ok(())
        }
    }

    struct Scope(&'static str);

    impl VisualizerSurface for Scope {
        fn render(&self) -> Result<SurfaceView> {
            Ok(SurfaceView::new(self.0))
        }
    }

    fn state() -> AppState {
        let instruments = Registry::new()
            .with(InstrumentDescriptor::instrument("First", Keys("first")))
            .and_then(|r| r.with(InstrumentDescriptor::instrument("Second", Keys("second"))))
            .unwrap();
        let visualizers = Registry::new()
            .with(VisualizerDescriptor::visualizer("Scope", Scope("scope")))
            .and_then(|r| r.with(VisualizerDescriptor::visualizer("Bars", Scope("bars"))))
            .unwrap();

        AppState::empty()
            .with_instruments(instruments.freeze())
            .with_visualizers(visualizers.freeze())
    }

    fn root(state: AppState) -> (CompositionRoot, Arc<RecordingFactory>) {
        let factory = Arc::new(RecordingFactory::default());
        let root = CompositionRoot::new(state, factory.clone()).unwrap();
        (root, factory)
    }

    #[test]
    fn mounts_the_first_entries_by_default() {
        let (mut root, factory) = root(state());
        let frame = root.render().unwrap();

        assert_eq!(root.selection(), Selection::default());
        assert_eq!(frame.instruments.options, vec!["First", "Second"]);
        assert_eq!(frame.instruments.active, Some(0));
        assert_eq!(frame.visualizers.active, Some(0));
        assert_eq!(frame.instrument.unwrap().title, "first");
        assert_eq!(frame.visualizer.unwrap().title, "scope");
        assert_eq!(factory.events(), vec!["engine-1:create"]);
    }

    #[test]
    fn switching_instruments_releases_before_rebuilding() {
        let (mut root, factory) = root(state());
        root.select_instrument(1).unwrap();

        assert_eq!(
            factory.events(),
            vec!["engine-1:create", "engine-1:disconnect", "engine-2:create"]
        );
        assert_eq!(root.render().unwrap().instrument.unwrap().title, "second");
    }

    #[test]
    fn reselecting_the_mounted_instrument_keeps_its_synth() {
        let (mut root, factory) = root(state());
        root.select_instrument(0).unwrap();

        assert_eq!(factory.events(), vec!["engine-1:create"]);
    }

    #[test]
    fn out_of_range_selection_keeps_the_mount() {
        let (mut root, factory) = root(state());
        let err = root.select_visualizer(5).unwrap_err();

        assert!(matches!(
            err,
            SandboxError::UnknownSelection {
                kind: "visualizer",
                index: 5,
                len: 2
            }
        ));
        assert!(root.select_instrument_by_name("Theremin").is_err());
        assert_eq!(root.selection(), Selection::default());
        assert_eq!(factory.events(), vec!["engine-1:create"]);
    }

    #[test]
    fn dispatch_reaches_the_mounted_synth() {
        let (mut root, factory) = root(state());
        root.select_visualizer_by_name("Bars").unwrap();
        root.dispatch(&SurfaceInput::Press("A4".parse().unwrap()))
            .unwrap();

        assert_eq!(factory.events(), vec!["engine-1:create", "engine-1:attack:A4"]);
        assert_eq!(root.render().unwrap().visualizer.unwrap().title, "bars");
    }

    #[test]
    fn shrinking_the_list_falls_back_to_the_first_entry() {
        let (mut root, factory) = root(state());
        root.select_instrument(1).unwrap();

        root.transition(|state| {
            let only_first: Vec<_> = state.instruments().unwrap()[..1].to_vec();
            state.with_instruments(only_first.into())
        })
        .unwrap();

        assert_eq!(root.selection().instrument, 0);
        assert_eq!(root.render().unwrap().instrument.unwrap().title, "first");
        assert_eq!(
            factory.events(),
            vec![
                "engine-1:create",
                "engine-1:disconnect",
                "engine-2:create",
                "engine-2:disconnect",
                "engine-3:create",
            ]
        );
    }

    #[test]
    fn unrelated_transitions_leave_mounts_alone() {
        let (mut root, factory) = root(state());
        let before = root.state();

        root.transition(|state| state.with_extra("tempo", serde_json::json!(96)))
            .unwrap();

        assert!(before.extra("tempo").is_none());
        assert!(root.state().extra("tempo").is_some());
        assert_eq!(factory.events(), vec!["engine-1:create"]);
    }

    #[test]
    fn empty_state_mounts_nothing() {
        let (mut root, factory) = root(AppState::empty());
        root.dispatch(&SurfaceInput::Press("C4".parse().unwrap()))
            .unwrap();
        let frame = root.render().unwrap();

        assert!(frame.instruments.options.is_empty());
        assert_eq!(frame.instruments.active, None);
        assert!(frame.instrument.is_none());
        assert!(frame.visualizer.is_none());
        assert!(root.synth().is_none());
        assert!(factory.events().is_empty());
    }

    #[test]
    fn dropping_the_root_releases_the_synth() {
        let (root, factory) = root(state());
        drop(root);

        assert_eq!(factory.events(), vec!["engine-1:create", "engine-1:disconnect"]);
    }

    #[test]
    fn default_sandbox_keeps_one_engine_routed() {
        let config = SandboxConfig::default();
        let bus = AudioBus::new(&config.audio);
        let engines = Arc::new(BusEngineFactory::new(bus.clone(), config.audio.block_size));
        let state = default_state(&config, &bus).unwrap();
        let mut root = CompositionRoot::new(state, engines).unwrap();
        assert_eq!(bus.active_connections().unwrap(), 1);

        root.dispatch(&SurfaceInput::Select("square".into()))
            .unwrap();
        root.select_instrument_by_name("Musical Saw").unwrap();
        root.dispatch(&SurfaceInput::Press("C5".parse().unwrap()))
            .unwrap();
        assert_eq!(bus.active_connections().unwrap(), 1);

        let frame = root.render().unwrap();
        assert_eq!(frame.instruments.active, Some(1));
        let view = frame.visualizer.unwrap();
        assert_eq!(view.title, "Waveform");
        assert!(view.meter("peak").unwrap() > 0.0);

        drop(root);
        assert_eq!(bus.active_connections().unwrap(), 0);
    }

    #[test]
    fn engine_failures_surface_from_selection() {
        let (mut root, factory) = root(state());
        factory.fail.set(true);

        let err = root.select_instrument(1).unwrap_err();
        assert!(matches!(err, SandboxError::Engine(_)));
        assert!(root.synth().is_none());
    }

    #[test]
    fn failed_instrument_mount_still_swaps_the_visualizer() {
        let old = AppState::empty()
            .with_instruments(
                Registry::new()
                    .with(InstrumentDescriptor::instrument("A", Keys("a")))
                    .unwrap()
                    .freeze(),
            )
            .with_visualizers(
                Registry::new()
                    .with(VisualizerDescriptor::visualizer("Old", Scope("old")))
                    .unwrap()
                    .freeze(),
            );
        let (mut root, factory) = root(old);
        factory.fail.set(true);

        let err = root
            .transition(|state| {
                let instruments = Registry::new()
                    .with(InstrumentDescriptor::instrument("B", Keys("b")))
                    .unwrap();
                let visualizers = Registry::new()
                    .with(VisualizerDescriptor::visualizer("New", Scope("new")))
                    .unwrap();
                state
                    .with_instruments(instruments.freeze())
                    .with_visualizers(visualizers.freeze())
            })
            .unwrap_err();
        assert!(matches!(err, SandboxError::Engine(_)));

        let frame = root.render().unwrap();
        assert_eq!(frame.visualizers.options, vec!["New"]);
        assert_eq!(frame.visualizers.active, Some(0));
        assert_eq!(frame.visualizer.unwrap().title, "new");
        assert_eq!(frame.instruments.options, vec!["B"]);
        assert_eq!(frame.instruments.active, None);
        assert!(frame.instrument.is_none());
        assert!(root.synth().is_none());
        assert_eq!(factory.events(), vec!["engine-1:create", "engine-1:disconnect"]);
    }
}
