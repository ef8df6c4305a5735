//! Boundary to the state provider that supplies propagated states.
//!
//! Catalog acquisition and propagation live outside this crate; the pipeline
//! only sees a [`Snapshot`] per cycle, fetched in a single synchronous call.
use parking_lot::Mutex;
use thiserror::Error;

use crate::state::{Catalog, CatalogError, StateVector};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("state provider unavailable: {0}")]
    Unavailable(String),

    #[error("state provider returned an invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Host and catalog states for one epoch.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub host: StateVector,
    pub catalog: Catalog,
}

impl Snapshot {
    pub fn new(host: StateVector, catalog: Catalog) -> Self {
        Snapshot { host, catalog }
    }

    pub fn epoch(&self) -> f64 {
        self.host.epoch
    }
}

pub trait StateProvider {
    /// States for the current epoch. Timeouts are the provider's concern.
    fn snapshot(&self) -> Result<Snapshot, ProviderError>;
}

impl<F> StateProvider for F
where
    F: Fn() -> Result<Snapshot, ProviderError>,
{
    fn snapshot(&self) -> Result<Snapshot, ProviderError> {
        self()
    }
}

/// Replays a queue of prepared results, then reports unavailability.
///
/// Intended for hardware-in-the-loop harnesses and tests.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    queue: Mutex<std::collections::VecDeque<Result<Snapshot, ProviderError>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        ScriptedProvider::default()
    }

    pub fn push(&self, result: Result<Snapshot, ProviderError>) {
        self.queue.lock().push_back(result);
    }

    pub fn push_snapshot(&self, snapshot: Snapshot) {
        self.push(Ok(snapshot));
    }

    pub fn push_outage(&self, reason: impl Into<String>) {
        self.push(Err(ProviderError::Unavailable(reason.into())));
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl StateProvider for ScriptedProvider {
    fn snapshot(&self) -> Result<Snapshot, ProviderError> {
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unavailable("no snapshot scripted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(epoch: f64) -> Snapshot {
        Snapshot::new(
            StateVector::new([6921.0, 0.0, 0.0], [0.0, 7.59, 0.0], epoch),
            Catalog::empty(),
        )
    }

    #[test]
    fn test_scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new();
        provider.push_snapshot(snapshot(0.0));
        provider.push_outage("ground link down");
        provider.push_snapshot(snapshot(60.0));
        assert_eq!(provider.pending(), 3);

        assert_eq!(provider.snapshot().unwrap().epoch(), 0.0);
        assert_eq!(
            provider.snapshot().unwrap_err(),
            ProviderError::Unavailable("ground link down".to_string())
        );
        assert_eq!(provider.snapshot().unwrap().epoch(), 60.0);
        assert!(matches!(provider.snapshot(), Err(ProviderError::Unavailable(_))));
    }

    #[test]
    fn test_closure_provider() {
        let provider = || -> Result<Snapshot, ProviderError> { Ok(snapshot(120.0)) };
        assert_eq!(provider.snapshot().unwrap().epoch(), 120.0);
    }
}
