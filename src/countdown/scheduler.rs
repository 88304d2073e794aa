use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::clock::Clock;
use super::remaining::{tick, RemainingTime};
use crate::events::Event;
use crate::state::{Listing, ListingKind};

/// Countdown value for one watched listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownEntry {
    pub kind: ListingKind,
    pub id: String,
    pub remaining: RemainingTime,
}

#[derive(Debug, Clone)]
struct Watched {
    kind: ListingKind,
    id: String,
    ending_at: DateTime<Utc>,
}

/// Owns the single periodic countdown tick.
///
/// Views subscribe the listings they currently show; every tick recomputes
/// all of them from the clock and publishes one [`Event::Countdown`].
/// The task is aborted on [`stop`](Self::stop) and on drop.
pub struct CountdownScheduler {
    watched: Arc<Mutex<Vec<Watched>>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl CountdownScheduler {
    pub fn new(period: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            watched: Arc::new(Mutex::new(Vec::new())),
            clock,
            period,
            handle: None,
        }
    }

    /// Watch one listing. Re-subscribing updates its end time in place.
    pub fn subscribe(&self, kind: ListingKind, id: &str, ending_at: DateTime<Utc>) {
        let mut watched = lock(&self.watched);
        match watched.iter_mut().find(|w| w.kind == kind && w.id == id) {
            Some(existing) => existing.ending_at = ending_at,
            None => watched.push(Watched {
                kind,
                id: id.to_string(),
                ending_at,
            }),
        }
    }

    /// Stop watching one listing. Returns whether it was watched.
    pub fn unsubscribe(&self, kind: ListingKind, id: &str) -> bool {
        let mut watched = lock(&self.watched);
        let before = watched.len();
        watched.retain(|w| !(w.kind == kind && w.id == id));
        watched.len() != before
    }

    /// Replace the watched set with the given listings. Listings without an
    /// end time are skipped.
    pub fn watch_visible<'a>(&self, listings: impl IntoIterator<Item = &'a Listing>) {
        let next: Vec<Watched> = listings
            .into_iter()
            .filter_map(|l| {
                l.ending_at.map(|ending_at| Watched {
                    kind: l.kind,
                    id: l.id.clone(),
                    ending_at,
                })
            })
            .collect();
        debug!(count = next.len(), "countdown watch set replaced");
        *lock(&self.watched) = next;
    }

    pub fn clear(&self) {
        lock(&self.watched).clear();
    }

    pub fn watched_count(&self) -> usize {
        lock(&self.watched).len()
    }

    /// Compute every watched countdown against the clock right now.
    pub fn snapshot(&self) -> Vec<CountdownEntry> {
        compute(&self.watched, self.clock.as_ref())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start ticking into `tx`. A no-op while already running.
    pub fn start(&mut self, tx: mpsc::Sender<Event>) {
        if self.is_running() {
            return;
        }
        let watched = Arc::clone(&self.watched);
        let clock = Arc::clone(&self.clock);
        let period = self.period;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let entries = compute(&watched, clock.as_ref());
                if entries.is_empty() {
                    continue;
                }
                if tx.send(Event::Countdown { entries }).await.is_err() {
                    debug!("countdown receiver gone, stopping");
                    break;
                }
            }
        }));
    }

    /// Cancel the tick. Subscriptions are kept so a later `start` resumes them.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for CountdownScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn compute(watched: &Mutex<Vec<Watched>>, clock: &dyn Clock) -> Vec<CountdownEntry> {
    let now = clock.now();
    lock(watched)
        .iter()
        .map(|w| CountdownEntry {
            kind: w.kind,
            id: w.id.clone(),
            remaining: tick(now, w.ending_at),
        })
        .collect()
}

fn lock(watched: &Mutex<Vec<Watched>>) -> MutexGuard<'_, Vec<Watched>> {
    watched.lock().unwrap_or_else(|e| e.into_inner())
}
