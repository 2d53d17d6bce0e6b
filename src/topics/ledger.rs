use std::{
    collections::{BTreeSet, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{foundation::error::MemeResult, topics::store::LedgerStore};

pub const DEFAULT_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// Persisted ledger state.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TopicRecord {
    #[serde(default)]
    pub topics: BTreeSet<String>,
    /// Start of the current window, epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub window_started_at: u64,
}

impl TopicRecord {
    pub fn fresh(now_ms: u64) -> Self {
        Self {
            topics: BTreeSet::new(),
            window_started_at: now_ms,
        }
    }

    pub fn is_expired(&self, now_ms: u64, window_ms: u64) -> bool {
        now_ms.saturating_sub(self.window_started_at) > window_ms
    }
}

pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// "Already used" topics, scoped to a rolling window.
pub trait TopicLedger {
    fn is_used(&mut self, topic: &str) -> MemeResult<bool>;

    /// Record `topic`. An expired window is cleared and restarted first.
    fn mark_used(&mut self, topic: &str) -> MemeResult<()>;

    /// Candidates not currently used, in input order.
    fn filter_unused(&mut self, candidates: &[String]) -> MemeResult<Vec<String>>;
}

/// [`TopicLedger`] over any [`LedgerStore`], expiring lazily on every read.
///
/// Assumes a single writer: concurrent processes sharing one store can lose updates.
#[derive(Debug)]
pub struct WindowedLedger<S, C = SystemClock> {
    store: S,
    clock: C,
    window_ms: u64,
}

impl<S: LedgerStore> WindowedLedger<S, SystemClock> {
    pub fn new(store: S, window_ms: u64) -> Self {
        Self::with_clock(store, SystemClock, window_ms)
    }
}

impl<S: LedgerStore, C: Clock> WindowedLedger<S, C> {
    pub fn with_clock(store: S, clock: C, window_ms: u64) -> Self {
        Self {
            store,
            clock,
            window_ms,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// The logical record as of now; an absent or expired record reads as a fresh window.
    pub fn current(&mut self) -> MemeResult<TopicRecord> {
        let now = self.clock.now_ms();
        match self.store.load()? {
            Some(record) if !record.is_expired(now, self.window_ms) => Ok(record),
            _ => Ok(TopicRecord::fresh(now)),
        }
    }
}

impl<S: LedgerStore, C: Clock> TopicLedger for WindowedLedger<S, C> {
    fn is_used(&mut self, topic: &str) -> MemeResult<bool> {
        Ok(self.current()?.topics.contains(topic))
    }

    #[tracing::instrument(skip(self))]
    fn mark_used(&mut self, topic: &str) -> MemeResult<()> {
        let mut record = self.current()?;
        record.topics.insert(topic.to_string());
        self.store.save(&record)?;
        tracing::info!(
            used = record.topics.len(),
            window_started_at = record.window_started_at,
            "topic recorded"
        );
        Ok(())
    }

    fn filter_unused(&mut self, candidates: &[String]) -> MemeResult<Vec<String>> {
        let record = self.current()?;
        let used: HashSet<&str> = record.topics.iter().map(String::as_str).collect();
        Ok(candidates
            .iter()
            .filter(|c| !used.contains(c.as_str()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/topics/ledger.rs"]
mod tests;
