use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A single tracked request: the opaque correlator the caller attached to it,
/// and whether it has been cancelled.
#[derive(Debug, Clone)]
struct TrackerEntry {
    any: Option<String>,
    cancelled: bool,
}

/// An in-process registry of in-flight serial numbers, used to mediate
/// cancellation of requests that are either being actively dispatched or
/// sitting in the [`PendingQueue`](crate::PendingQueue) waiting for their
/// execution window.
///
/// A [`Tracker`] is a plain service value: construct one (typically via
/// [`Tracker::default`]), wrap it in an [`Arc`], and share that `Arc` with
/// every component (consumer, dispatcher, pending queue, executor) that needs
/// to add, cancel, or remove entries. There is no hidden global singleton.
///
/// Every method takes `&self` and is safe to call concurrently from any
/// number of tasks: mutation happens under a single [`parking_lot::Mutex`],
/// and readers observe a consistent snapshot of a single entry.
#[derive(Debug, Default)]
pub struct Tracker {
    entries: Mutex<HashMap<String, TrackerEntry>>,
}

impl Tracker {
    /// Creates a new, empty [`Tracker`], already wrapped in an [`Arc`] for
    /// convenient sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts tracking the given serial number, recording the caller-supplied
    /// `any` correlator. If `sn` is already tracked, this overwrites the
    /// existing entry and resets its `cancelled` flag to `false`.
    pub fn add(&self, sn: impl Into<String>, any: Option<String>) {
        self.entries.lock().insert(
            sn.into(),
            TrackerEntry {
                any,
                cancelled: false,
            },
        );
    }

    /// Marks the given serial number as cancelled.
    ///
    /// Returns `true` iff the serial number was tracked and was not already
    /// cancelled (i.e., this call had an effect). Returns `false` both when
    /// the serial number is unknown and when it was already cancelled.
    pub fn cancel(&self, sn: &str) -> bool {
        let mut entries = self.entries.lock();

        match entries.get_mut(sn) {
            Some(entry) if !entry.cancelled => {
                entry.cancelled = true;
                true
            }
            _ => false,
        }
    }

    /// Reports whether the given serial number is tracked and cancelled.
    ///
    /// An untracked serial number reports `false`: cancellation only applies
    /// to requests the tracker knows about.
    pub fn cancelled(&self, sn: &str) -> bool {
        self.entries
            .lock()
            .get(sn)
            .is_some_and(|entry| entry.cancelled)
    }

    /// Reports whether the given serial number is currently tracked at all.
    pub fn contains(&self, sn: &str) -> bool {
        self.entries.lock().contains_key(sn)
    }

    /// Returns the `any` correlator recorded for the given serial number, if
    /// it is tracked.
    pub fn any(&self, sn: &str) -> Option<String> {
        self.entries.lock().get(sn).and_then(|e| e.any.clone())
    }

    /// Stops tracking the given serial number. A no-op if it was not tracked.
    ///
    /// Called once an RMI completes, is rejected, or is otherwise explicitly
    /// forgotten (e.g., after a cancelled dispatch is finalized).
    pub fn remove(&self, sn: &str) {
        self.entries.lock().remove(sn);
    }

    /// Reports the number of currently tracked serial numbers. Mostly useful
    /// for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Reports whether no serial numbers are currently tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_query() {
        let tracker = Tracker::default();

        tracker.add("sn-1", Some("correlator".to_string()));

        assert!(tracker.contains("sn-1"));
        assert!(!tracker.cancelled("sn-1"));
        assert_eq!(tracker.any("sn-1").as_deref(), Some("correlator"));
    }

    #[test]
    fn cancel_reports_effect_once() {
        let tracker = Tracker::default();
        tracker.add("sn-1", None);

        assert!(tracker.cancel("sn-1"));
        assert!(tracker.cancelled("sn-1"));

        // Already cancelled: no further effect.
        assert!(!tracker.cancel("sn-1"));
    }

    #[test]
    fn cancel_of_unknown_sn_has_no_effect() {
        let tracker = Tracker::default();

        assert!(!tracker.cancel("unknown"));
        assert!(!tracker.cancelled("unknown"));
    }

    #[test]
    fn remove_forgets_entry() {
        let tracker = Tracker::default();
        tracker.add("sn-1", None);
        tracker.remove("sn-1");

        assert!(!tracker.contains("sn-1"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn concurrent_usage_via_shared_handle() {
        let tracker = Tracker::new_shared();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let sn = format!("sn-{i}");
                    tracker.add(&sn, None);
                    assert!(tracker.cancel(&sn));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.len(), 8);
    }
}
