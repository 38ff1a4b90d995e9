use std::{fmt, sync::Arc};

use crate::{InstrumentSurface, VisualizerSurface};

/// A named, pluggable surface.
///
/// Descriptors are immutable: the name and surface are fixed at construction
/// and clones share the same surface.
pub struct Descriptor<S: ?Sized> {
    name: Arc<str>,
    surface: Arc<S>,
}

pub type InstrumentDescriptor = Descriptor<dyn InstrumentSurface>;
pub type VisualizerDescriptor = Descriptor<dyn VisualizerSurface>;

impl<S: ?Sized> Descriptor<S> {
    pub fn new(name: impl Into<Arc<str>>, surface: Arc<S>) -> Self {
        Self {
            name: name.into(),
            surface,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    /// Whether both descriptors share the same surface instance.
    pub fn same_surface(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.surface), Arc::as_ptr(&other.surface))
    }
}

impl InstrumentDescriptor {
    pub fn instrument(name: impl Into<Arc<str>>, surface: impl InstrumentSurface + 'static) -> Self {
        Self::new(name, Arc::new(surface))
    }
}

impl VisualizerDescriptor {
    pub fn visualizer(name: impl Into<Arc<str>>, surface: impl VisualizerSurface + 'static) -> Self {
        Self::new(name, Arc::new(surface))
    }
}

impl<S: ?Sized> Clone for Descriptor<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            surface: self.surface.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Descriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
