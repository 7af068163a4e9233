use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::models::LiveRoom;

/// The complete set of currently-live broadcasters as of the last
/// successful full scan. Built wholesale and never mutated in place.
pub type DirectorySnapshot = Arc<FxHashMap<u64, LiveRoom>>;

/// Holds the latest published directory snapshot.
///
/// `replace` is the only mutator and swaps the whole snapshot behind the
/// lock, so a reader either sees the fully-old or the fully-new directory;
/// mixed states cannot be observed. Entries are immutable once installed,
/// so no per-key locking is needed.
#[derive(Debug, Default)]
pub struct LiveRoomCache {
    inner: RwLock<DirectorySnapshot>,
}

impl LiveRoomCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the broadcaster is in the current snapshot, i.e. live as of
    /// the last scan.
    pub fn contains(&self, uid: u64) -> bool {
        self.inner.read().contains_key(&uid)
    }

    pub fn get(&self, uid: u64) -> Option<LiveRoom> {
        self.inner.read().get(&uid).cloned()
    }

    /// Atomically publish a freshly-built directory.
    pub fn replace(&self, rooms: FxHashMap<u64, LiveRoom>) {
        *self.inner.write() = Arc::new(rooms);
    }

    /// Cheap handle to the current snapshot for iteration.
    pub fn snapshot(&self) -> DirectorySnapshot {
        Arc::clone(&self.inner.read())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
