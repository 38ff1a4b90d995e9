use std::{
    collections::{BTreeSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{AudioConfig, Result, SandboxError};

/// Identifies one engine's routing into the output bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

/// Shared output destination every sound engine routes into.
///
/// The bus keeps a rolling window of the most recent samples so that
/// visualizers can observe the ambient signal without holding a reference to
/// any particular engine.
#[derive(Clone)]
pub struct AudioBus {
    sample_rate: u32,
    shared: Arc<Mutex<BusState>>,
}

#[derive(Debug)]
struct BusState {
    capacity: usize,
    next_id: u64,
    connections: BTreeSet<ConnectionId>,
    history: VecDeque<f32>,
}

impl AudioBus {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            shared: Arc::new(Mutex::new(BusState {
                capacity: config.bus_capacity.max(1),
                next_id: 0,
                connections: BTreeSet::new(),
                history: VecDeque::with_capacity(config.bus_capacity.max(1)),
            })),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Opens a new route into the bus.
    pub fn connect(&self) -> Result<ConnectionId> {
        let mut state = self.lock()?;
        let id = ConnectionId(state.next_id);
        state.next_id += 1;
        state.connections.insert(id);
        Ok(id)
    }

    /// Closes a route. Returns `false` if it was already closed.
    pub fn disconnect(&self, id: ConnectionId) -> Result<bool> {
        let mut state = self.lock()?;
        Ok(state.connections.remove(&id))
    }

    pub fn is_connected(&self, id: ConnectionId) -> Result<bool> {
        Ok(self.lock()?.connections.contains(&id))
    }

    /// Number of engines currently producing output.
    pub fn active_connections(&self) -> Result<usize> {
        Ok(self.lock()?.connections.len())
    }

    /// Appends rendered samples on behalf of a connected engine.
    pub fn write(&self, id: ConnectionId, samples: &[f32]) -> Result<()> {
        let mut state = self.lock()?;
        if !state.connections.contains(&id) {
            return Err(SandboxError::engine(format!(
                "connection {} is not routed to the output bus",
                id.0
            )));
        }

        state.history.extend(samples.iter().copied());
        let overflow = state.history.len().saturating_sub(state.capacity);
        state.history.drain(..overflow);
        Ok(())
    }

    /// Read-only view handed to visualizers.
    pub fn tap(&self) -> BusTap {
        BusTap {
            sample_rate: self.sample_rate,
            shared: self.shared.clone(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BusState>> {
        lock_state(&self.shared)
    }
}

impl std::fmt::Debug for AudioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBus")
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Observes the bus output without being able to route into it.
#[derive(Clone)]
pub struct BusTap {
    sample_rate: u32,
    shared: Arc<Mutex<BusState>>,
}

impl BusTap {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns up to `len` of the most recent samples, oldest first.
    pub fn recent(&self, len: usize) -> Result<Vec<f32>> {
        let state = lock_state(&self.shared)?;
        let skip = state.history.len().saturating_sub(len);
        Ok(state.history.iter().skip(skip).copied().collect())
    }
}

impl std::fmt::Debug for BusTap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusTap").finish()
    }
}

fn lock_state(shared: &Mutex<BusState>) -> Result<MutexGuard<'_, BusState>> {
    shared
        .lock()
        .map_err(|_| SandboxError::msg("output bus has been poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(capacity: usize) -> AudioBus {
        AudioBus::new(&AudioConfig {
            bus_capacity: capacity,
            ..AudioConfig::default()
        })
    }

    #[test]
    fn tracks_connections() {
        let bus = bus(16);
        let first = bus.connect().unwrap();
        let second = bus.connect().unwrap();
        assert_ne!(first, second);
        assert_eq!(bus.active_connections().unwrap(), 2);

        assert!(bus.disconnect(first).unwrap());
        assert!(!bus.disconnect(first).unwrap());
        assert_eq!(bus.active_connections().unwrap(), 1);
    }

    #[test]
    fn retains_only_recent_samples() {
        let bus = bus(4);
        let id = bus.connect().unwrap();
        bus.write(id, &[1.0, 2.0, 3.0]).unwrap();
        bus.write(id, &[4.0, 5.0, 6.0]).unwrap();

        let tap = bus.tap();
        assert_eq!(tap.recent(10).unwrap(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(tap.recent(2).unwrap(), vec![5.0, 6.0]);
    }

    #[test]
    fn refuses_writes_after_disconnect() {
        let bus = bus(4);
        let id = bus.connect().unwrap();
        bus.disconnect(id).unwrap();

        let err = bus.write(id, &[1.0]).unwrap_err();
        assert!(matches!(err, SandboxError::Engine(_)));
    }
}
