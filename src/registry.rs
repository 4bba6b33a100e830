use std::sync::Mutex;

use crate::models::StuckObject;

/// Shared record of objects found stuck in a terminating state.
///
/// Owned by the process context and handed to the scanner, the reclaimer and
/// the HTTP handlers by reference; there is a single writer (the scan loop)
/// and any number of readers. Entries are keyed by object identity, so an
/// object that stays stuck across cycles keeps a single entry until it is
/// finally gone from the cluster, at which point the next cycle drops it via
/// [`StuckRegistry::retain_cycle`].
#[derive(Debug, Default)]
pub struct StuckRegistry {
    entries: Mutex<Vec<StuckObject>>,
}

impl StuckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts an entry keyed by (namespace, resource type, name).
    ///
    /// The deletion timestamp on a live object never changes, so on a repeat
    /// observation the existing entry is kept as-is.
    pub fn record(&self, obj: StuckObject) {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        if !entries.iter().any(|e| e.object_ref() == obj.object_ref()) {
            entries.push(obj);
        }
    }

    /// Drops every entry that was not observed again in the cycle that just
    /// completed. `seen` is the set of entries the cycle recorded.
    pub fn retain_cycle(&self, seen: &[StuckObject]) {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        entries.retain(|e| seen.iter().any(|s| s.object_ref() == e.object_ref()));
    }

    /// A snapshot copy of the current entries. The lock is held only for the
    /// copy, never across I/O.
    pub fn list(&self) -> Vec<StuckObject> {
        self.entries.lock().expect("registry lock poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").len()
    }
}
