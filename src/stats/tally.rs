use crate::output::ProgressSink;
use crate::stats::StatsSnapshot;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Set of user ids already seen during the current run
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `user_id` as seen, returning true only on its first appearance
    pub fn admit(&mut self, user_id: &str) -> bool {
        if self.seen.contains(user_id) {
            return false;
        }
        self.seen.insert(user_id.to_string())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.seen.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// Brand histogram plus the number of counted users
///
/// `total` is only ever changed together with one bucket, so the sum of all
/// buckets always equals `total`.
#[derive(Debug, Default, Clone)]
pub struct BrandCounts {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl BrandCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one user under `brand`
    pub fn observe(&mut self, brand: &str) {
        *self.counts.entry(brand.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self, brand: &str) -> u64 {
        self.counts.get(brand).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::new(self.counts.clone(), self.total)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}

struct TallyState {
    seen: DedupSet,
    counts: BrandCounts,
    sink: Box<dyn ProgressSink>,
}

/// Run-scoped dedup gate, brand counter and progress log behind one lock
///
/// Every mutation takes the same mutex, so "seen", "counted" and "logged" can
/// never be observed out of step with each other. Readers copy the counts
/// out under the lock and release it immediately.
pub struct Tally {
    state: Mutex<TallyState>,
}

impl Tally {
    /// Creates an empty tally that mirrors counted users into `sink`
    pub fn new(sink: Box<dyn ProgressSink>) -> Self {
        Self {
            state: Mutex::new(TallyState {
                seen: DedupSet::new(),
                counts: BrandCounts::new(),
                sink,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TallyState> {
        // A panic while holding the lock cannot leave the counters half
        // updated, so the poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a fresh run: forgets every seen user, zeroes the counters and
    /// truncates the progress log
    pub fn reset(&self) -> std::io::Result<()> {
        let mut state = self.lock();
        state.seen.clear();
        state.counts.clear();
        state.sink.reset()
    }

    /// Atomic check-and-mark: true exactly once per distinct `user_id` per run
    pub fn admit(&self, user_id: &str) -> bool {
        self.lock().seen.admit(user_id)
    }

    /// Logs `user_id` under `brand` and counts it, as one atomic step
    ///
    /// Returns the new number of counted users. A failed log append is
    /// reported but does not stop the user from being counted: the in-memory
    /// histogram is the authoritative result.
    pub fn record(&self, user_id: &str, brand: &str) -> u64 {
        let mut state = self.lock();
        if let Err(e) = state.sink.append(user_id, brand) {
            tracing::warn!("Failed to append {} to progress log: {}", user_id, e);
        }
        state.counts.observe(brand);
        state.counts.total()
    }

    /// Number of counted users
    pub fn total(&self) -> u64 {
        self.lock().counts.total()
    }

    /// Number of distinct users admitted, including those never counted
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    pub fn has_seen(&self, user_id: &str) -> bool {
        self.lock().seen.contains(user_id)
    }

    /// Copies the current counts out; safe to call while the crawl runs
    pub fn snapshot(&self) -> StatsSnapshot {
        self.lock().counts.snapshot()
    }

    /// Flushes any buffered progress log output
    pub fn flush(&self) -> std::io::Result<()> {
        self.lock().sink.flush()
    }
}
