use crate::model::Snapshot;
use std::sync::{Arc, RwLock};

/// The last snapshot published by the refresh loop, shared with the web handlers.
///
/// A snapshot is swapped in as a whole, so readers see either the previous one or the new one.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => {
                log::warn!("Snapshot lock was poisoned, replacing anyway");
                *poisoned.into_inner() = Some(snapshot);
            }
        }
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => {
                log::trace!("Unable to lock snapshot, nothing to read");
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::SharedSnapshot;
    use crate::api::response::production::Production;
    use crate::model::Snapshot;
    use chrono::Utc;

    #[test]
    fn empty_until_published() {
        let state = SharedSnapshot::new();
        assert!(state.latest().is_none());

        state.publish(Snapshot {
            production: Production::default(),
            inventory: vec![],
            inverters: vec![],
            updated: Utc::now(),
        });
        assert!(state.latest().is_some());
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let state = SharedSnapshot::new();
        let first = Utc::now();
        state.publish(Snapshot {
            production: Production::default(),
            inventory: vec![],
            inverters: vec![],
            updated: first,
        });
        let held = state.latest().unwrap();

        state.publish(Snapshot {
            production: Production::default(),
            inventory: vec![],
            inverters: vec![],
            updated: first + chrono::Duration::seconds(1),
        });

        assert_eq!(first, held.updated);
        assert_ne!(first, state.latest().unwrap().updated);
    }
}
