use std::{fmt, sync::Arc};

use crate::{Descriptor, InstrumentSurface, Result, SandboxError, VisualizerSurface};

/// Ordered, frozen list of registered descriptors.
pub type PluginList<S> = Arc<[Descriptor<S>]>;

/// Names the category a surface type belongs to.
pub trait PluginKind {
    const KIND: &'static str;
}

impl PluginKind for dyn InstrumentSurface {
    const KIND: &'static str = "instrument";
}

impl PluginKind for dyn VisualizerSurface {
    const KIND: &'static str = "visualizer";
}

/// Append-only registry populated at startup.
///
/// Registration order is display order. Names must be non-empty and unique.
pub struct Registry<S: ?Sized> {
    entries: Vec<Descriptor<S>>,
}

impl<S: ?Sized + PluginKind> Registry<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, descriptor: Descriptor<S>) -> Result<()> {
        let name = descriptor.name();
        if name.trim().is_empty() {
            return Err(SandboxError::EmptyName { kind: S::KIND });
        }
        if self.find(name).is_some() {
            return Err(SandboxError::DuplicateName {
                kind: S::KIND,
                name: name.to_string(),
            });
        }

        tracing::debug!(kind = S::KIND, name, "registered plugin");
        self.entries.push(descriptor);
        Ok(())
    }

    /// Builder form of [`Registry::register`].
    pub fn with(mut self, descriptor: Descriptor<S>) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn list(&self) -> &[Descriptor<S>] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&Descriptor<S>> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn freeze(self) -> PluginList<S> {
        Arc::from(self.entries)
    }
}

impl<S: ?Sized + PluginKind> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(Descriptor::name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SurfaceView, VisualizerDescriptor};

    struct Blank;

    impl VisualizerSurface for Blank {
        fn render(&self) -> Result<SurfaceView> {
            Ok(SurfaceView::new("blank"))
        }
    }

    #[test]
    fn keeps_registration_order() {
        let registry = Registry::new()
            .with(VisualizerDescriptor::visualizer("Zeta", Blank))
            .and_then(|r| r.with(VisualizerDescriptor::visualizer("Alpha", Blank)))
            .unwrap();

        let names: Vec<_> = registry.list().iter().map(Descriptor::name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);

        let list = registry.freeze();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].name(), "Alpha");
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = Registry::new();
        registry
            .register(VisualizerDescriptor::visualizer("Scope", Blank))
            .unwrap();

        let err = registry
            .register(VisualizerDescriptor::visualizer("Scope", Blank))
            .unwrap_err();

        assert!(matches!(err, SandboxError::DuplicateName { kind: "visualizer", .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_empty_names() {
        let mut registry = Registry::<dyn VisualizerSurface>::new();
        let err = registry
            .register(VisualizerDescriptor::visualizer("  ", Blank))
            .unwrap_err();

        assert!(matches!(err, SandboxError::EmptyName { .. }));
        assert!(registry.is_empty());
    }
}
