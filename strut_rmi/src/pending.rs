use crate::document::Envelope;
use crate::tracker::Tracker;
use crate::window;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Notify;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// A single in-memory projection of a file under `ROOT`, kept alongside the
/// filesystem create time (`ctime`) that orders it relative to its peers.
struct PendingItem<T> {
    envelope: Envelope<T>,
    ctime: (i64, i64),
}

struct State<T> {
    /// Ordered oldest-first by `ctime`; the tail is popped first.
    pending: Vec<PendingItem<T>>,
    /// Entries handed to a caller via [`PendingQueue::get`] but not yet
    /// [committed](PendingQueue::commit).
    uncommitted: HashMap<String, Envelope<T>>,
}

/// A durable, on-disk FIFO of [`Envelope`]s awaiting dispatch, most commonly
/// because their execution [window](crate::window::Window) hasn't opened
/// yet.
///
/// Every entry is persisted as `ROOT/{sn}` before it is considered enqueued,
/// so a process restart recovers exactly the set of requests that were
/// pending (not yet [committed](PendingQueue::commit)) when the process went
/// down. Ordering between entries is authoritative on the filesystem: the
/// create time (`ctime`) of each file is re-read on every
/// [`get`](PendingQueue::get) scan, so entries always dispatch in the order
/// their files were created, regardless of the order the in-memory queue
/// happened to hold them in.
///
/// Constructed once per `ROOT` directory and shared (via [`Arc`]) across
/// every consumer and dispatcher task that needs it.
pub struct PendingQueue<T> {
    root: PathBuf,
    tracker: Arc<Tracker>,
    state: Mutex<State<T>>,
    notify: Notify,
}

impl<T> PendingQueue<T>
where
    T: DeserializeOwned,
{
    /// Opens the pending queue rooted at `root`, creating the directory if
    /// it does not exist, and loading whatever entries are already there.
    pub fn open(root: impl Into<PathBuf>, tracker: Arc<Tracker>) -> io::Result<Arc<Self>> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let queue = Arc::new(Self {
            root,
            tracker,
            state: Mutex::new(State {
                pending: Vec::new(),
                uncommitted: HashMap::new(),
            }),
            notify: Notify::new(),
        });

        queue.rescan();

        Ok(queue)
    }

    /// Re-reads `ROOT`, loading any file not already tracked in memory and
    /// refreshing the `ctime` of every entry, then re-sorts `pending`
    /// oldest-first. Files that fail to decode are deleted, per the
    /// invariant that every file under `ROOT` either decodes to a valid
    /// envelope or does not survive the scan.
    fn rescan(&self) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) => {
                error!(root = %self.root.display(), %error, "Failed to scan pending queue directory");
                return;
            }
        };

        let mut state = self.state.lock();
        let known: std::collections::HashSet<String> = state
            .pending
            .iter()
            .map(|item| item.envelope.sn.clone())
            .chain(state.uncommitted.keys().cloned())
            .collect();

        for entry in entries.flatten() {
            let path = entry.path();
            let sn = match path.file_name().and_then(|name| name.to_str()) {
                Some(sn) => sn.to_string(),
                None => continue,
            };

            if known.contains(&sn) {
                continue;
            }

            match load_envelope::<T>(&path) {
                Ok(envelope) => {
                    let ctime = file_ctime(&path).unwrap_or((0, 0));
                    state.pending.push(PendingItem { envelope, ctime });
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "Discarding unreadable pending entry");
                    let _ = fs::remove_file(&path);
                }
            }
        }

        for item in &mut state.pending {
            if let Ok(ctime) = file_ctime(&self.path_for(&item.envelope.sn)) {
                item.ctime = ctime;
            }
        }

        // Oldest-first: the tail (highest index) is popped first, so sort
        // descending by ctime.
        state
            .pending
            .sort_by(|a, b| b.ctime.cmp(&a.ctime));
    }

    fn path_for(&self, sn: &str) -> PathBuf {
        self.root.join(sn)
    }
}

impl<T> PendingQueue<T>
where
    T: Serialize,
{
    /// Enqueues `envelope`, stamping its `ts` and `url`, writing it to disk
    /// (fsync'd before this call returns), registering it with the
    /// [`Tracker`], and inserting it into the in-memory queue.
    pub fn add(&self, url: impl Into<String>, mut envelope: Envelope<T>) -> io::Result<()> {
        envelope.stamp(url);

        let path = self.path_for(&envelope.sn);
        let dump = envelope
            .dump()
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

        write_and_sync(&path, dump.as_bytes())?;

        let ctime = file_ctime(&path).unwrap_or((0, 0));

        {
            let mut state = self.state.lock();
            self.tracker.add(envelope.sn.clone(), envelope.any.clone());
            state.pending.insert(
                0,
                PendingItem {
                    envelope,
                    ctime,
                },
            );
        }

        self.notify.notify_waiters();

        Ok(())
    }
}

impl<T> PendingQueue<T>
where
    T: DeserializeOwned + Clone,
{
    /// Blocks up to `wait` for a dispatchable entry, polling in one-second
    /// increments. Entries whose window is still in the future (and which
    /// have not been cancelled) are skipped in place; a successful pop moves
    /// the entry from `pending` to `uncommitted` under lock.
    pub async fn get(&self, wait: Duration) -> Option<Envelope<T>> {
        let deadline = SystemTime::now() + wait;

        loop {
            self.rescan();

            if let Some(envelope) = self.try_pop() {
                return Some(envelope);
            }

            let remaining = deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO);

            if remaining.is_zero() {
                return None;
            }

            let slice = remaining.min(Duration::from_secs(1));
            let _ = timeout(slice, self.notify.notified()).await;
        }
    }

    /// Scans the tail of `pending` (oldest-first) for the first entry that
    /// is dispatchable, skipping delayed entries in place without disturbing
    /// their relative order. Mirrors the reference store's linear scan from
    /// the oldest end of the queue.
    fn try_pop(&self) -> Option<Envelope<T>> {
        let now = SystemTime::now();
        let mut state = self.state.lock();

        let mut scanned = 0;
        while scanned < state.pending.len() {
            let index = state.pending.len() - 1 - scanned;
            let candidate = &state.pending[index];

            let delayed = candidate.envelope.window.is_some()
                && !self.tracker.cancelled(&candidate.envelope.sn)
                && window::future(candidate.envelope.window.as_ref(), now);

            if delayed {
                scanned += 1;
                continue;
            }

            let item = state.pending.remove(index);
            let sn = item.envelope.sn.clone();
            let envelope = item.envelope;

            debug!(sn = %sn, url = %envelope.url, "Popped pending envelope");

            state.uncommitted.insert(sn, envelope.clone());
            return Some(envelope);
        }

        None
    }

    /// Commits a previously popped entry: removes it from `uncommitted` and
    /// unlinks its file. An unknown `sn` is non-fatal; the caller is
    /// expected to log it.
    pub fn commit(&self, sn: &str) -> bool {
        let envelope = {
            let mut state = self.state.lock();
            state.uncommitted.remove(sn)
        };

        match envelope {
            Some(_) => {
                let path = self.path_for(sn);
                if let Err(error) = fs::remove_file(&path) {
                    warn!(sn, %error, "Failed to unlink committed pending entry");
                }
                info!(sn, "Committed pending entry");
                true
            }
            None => false,
        }
    }
}

fn load_envelope<T>(path: &Path) -> io::Result<Envelope<T>>
where
    T: DeserializeOwned,
{
    let bytes = fs::read(path)?;
    Envelope::load(&bytes).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;

    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn file_ctime(path: &Path) -> io::Result<(i64, i64)> {
    let metadata = fs::metadata(path)?;
    Ok((metadata.ctime(), metadata.ctime_nsec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Body, Request};
    use crate::window::Window;
    use serde_json::Value;
    use tempfile::tempdir;

    fn sample(sn: &str, window: Option<Window>) -> Envelope<Value> {
        Envelope {
            sn: sn.to_string(),
            ts: 0,
            url: String::new(),
            window,
            any: None,
            replyto: None,
            version: "1.0".to_string(),
            routing: ["agent".to_string(), "plugin".to_string()],
            body: Body::Request(Request {
                method: "noop".to_string(),
                args: Value::Null,
            }),
            unknown: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let tracker = Tracker::new_shared();
        let queue = PendingQueue::<Value>::open(dir.path(), tracker).unwrap();

        queue.add("amqp://broker", sample("sn-1", None)).unwrap();

        let popped = queue.get(Duration::from_secs(1)).await.unwrap();
        assert_eq!(popped.sn, "sn-1");

        assert!(queue.commit("sn-1"));
        assert!(!dir.path().join("sn-1").exists());
    }

    #[tokio::test]
    async fn future_window_is_skipped_until_open() {
        let dir = tempdir().unwrap();
        let tracker = Tracker::new_shared();
        let queue = PendingQueue::<Value>::open(dir.path(), tracker).unwrap();

        let far_future = Window::new(SystemTime::now() + Duration::from_secs(3600), Duration::from_secs(60));
        queue
            .add("amqp://broker", sample("delayed", Some(far_future)))
            .unwrap();
        queue.add("amqp://broker", sample("ready", None)).unwrap();

        let popped = queue.get(Duration::from_secs(1)).await.unwrap();
        assert_eq!(popped.sn, "ready");
    }

    #[tokio::test]
    async fn cancelling_a_future_window_makes_it_immediately_dispatchable() {
        let dir = tempdir().unwrap();
        let tracker = Tracker::new_shared();
        let queue = PendingQueue::<Value>::open(dir.path(), Arc::clone(&tracker)).unwrap();

        let far_future = Window::new(SystemTime::now() + Duration::from_secs(3600), Duration::from_secs(60));
        queue
            .add("amqp://broker", sample("delayed", Some(far_future)))
            .unwrap();

        // Still delayed: the window hasn't opened and the request hasn't
        // been cancelled.
        let popped = queue.get(Duration::from_millis(50)).await;
        assert!(popped.is_none());

        assert!(tracker.cancel("delayed"));

        // Cancellation jumps the window: a cancelled request is dispatchable
        // immediately so its executor can report the cancellation instead of
        // waiting out a window that no longer matters.
        let popped = queue.get(Duration::from_secs(1)).await.unwrap();
        assert_eq!(popped.sn, "delayed");
    }

    #[tokio::test]
    async fn get_times_out_when_empty() {
        let dir = tempdir().unwrap();
        let tracker = Tracker::new_shared();
        let queue = PendingQueue::<Value>::open(dir.path(), tracker).unwrap();

        let popped = queue.get(Duration::from_millis(50)).await;
        assert!(popped.is_none());
    }

    #[tokio::test]
    async fn restart_recovers_uncommitted_entries_as_pending() {
        let dir = tempdir().unwrap();
        let tracker = Tracker::new_shared();
        let queue = PendingQueue::<Value>::open(dir.path(), Arc::clone(&tracker)).unwrap();

        queue.add("amqp://broker", sample("sn-1", None)).unwrap();
        let _popped = queue.get(Duration::from_secs(1)).await.unwrap();
        // Simulate a crash: don't commit, just reopen against the same ROOT.

        let reopened = PendingQueue::<Value>::open(dir.path(), tracker).unwrap();
        let recovered = reopened.get(Duration::from_secs(1)).await.unwrap();
        assert_eq!(recovered.sn, "sn-1");
    }

    #[test]
    fn corrupt_file_is_discarded_on_load() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("garbage"), b"not json").unwrap();

        let tracker = Tracker::new_shared();
        let _queue = PendingQueue::<Value>::open(dir.path(), tracker).unwrap();

        assert!(!dir.path().join("garbage").exists());
    }
}
