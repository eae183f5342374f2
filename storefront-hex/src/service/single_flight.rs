//! Single-flight guard for network refreshes.
//!
//! At most one flight runs at a time. A call issued while a flight is in
//! progress waits for it and then joins its result instead of starting a
//! second request. Flights run in issue order, so a slower, older request can
//! never land on top of a newer one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, watch};

#[derive(Debug, Default)]
pub struct SingleFlight {
    gate: Mutex<()>,
    issued: AtomicU64,
    settled: AtomicU64,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` with this call's generation, or returns `None` when the
    /// call was covered by a flight that completed while it waited.
    ///
    /// Generations increase strictly with issue order.
    pub async fn run<F, Fut, T>(&self, work: F) -> Option<T>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = T>,
    {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _gate = self.gate.lock().await;
        if self.settled.load(Ordering::SeqCst) >= generation {
            return None;
        }

        let output = work(generation).await;
        // Everyone who queued up during this flight shares its result.
        self.settled
            .store(self.issued.load(Ordering::SeqCst), Ordering::SeqCst);
        Some(output)
    }

    pub fn in_flight(&self) -> bool {
        self.gate.try_lock().is_err()
    }
}

/// Raises a busy flag on a watched state for as long as it lives.
///
/// The flag is lowered on drop, so a cancelled flight never leaves the state
/// stuck in "loading".
pub(crate) struct BusyGuard<'a, T> {
    state: &'a watch::Sender<T>,
    flag: fn(&mut T) -> &mut bool,
}

impl<'a, T> BusyGuard<'a, T> {
    pub(crate) fn raise(state: &'a watch::Sender<T>, flag: fn(&mut T) -> &mut bool) -> Self {
        state.send_modify(|s| *flag(s) = true);
        Self { state, flag }
    }
}

impl<T> Drop for BusyGuard<'_, T> {
    fn drop(&mut self) {
        let flag = self.flag;
        self.state.send_modify(|s| *flag(s) = false);
    }
}
