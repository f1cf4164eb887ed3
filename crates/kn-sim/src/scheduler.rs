//! `MotionLoop` — the periodic worker that drives [`MotionSimulator`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::{MotionSimulator, SharedIndex, SimError, SimResult, TickObserver, TickOutcome};

/// Handle to a running motion loop.
///
/// The worker waits `interval`, checks the active flag, runs one tick, and
/// goes round again.  It exits without rescheduling when stopped, or when a
/// tick reports [`TickOutcome::Skipped`] (the index went static).  Dropping
/// the handle stops and joins the worker.
pub struct MotionLoop {
    stop:   Option<Sender<()>>,
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl MotionLoop {
    pub fn spawn<O>(
        shared:        SharedIndex,
        mut simulator: MotionSimulator,
        interval:      Duration,
        mut observer:  O,
    ) -> SimResult<Self>
    where
        O: TickObserver + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let handle = thread::Builder::new()
            .name("kn-motion".into())
            .spawn(move || {
                let mut ticks = 0u64;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if !flag.load(Ordering::Acquire) {
                        break;
                    }
                    let now = simulator.clock().now();
                    let outcome = simulator.tick(&shared, now, &mut observer);
                    ticks += 1;
                    if outcome == TickOutcome::Skipped {
                        debug!(ticks, "index is static; motion loop exiting");
                        break;
                    }
                }
                flag.store(false, Ordering::Release);
                ticks
            })?;

        info!(interval_ms = interval.as_millis() as u64, "motion loop started");
        Ok(Self { stop: Some(stop_tx), active, handle: Some(handle) })
    }

    /// `false` once the worker has exited or been asked to.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Signal the worker and wait for it.  Returns the number of ticks run.
    pub fn stop(mut self) -> SimResult<u64> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> SimResult<u64> {
        self.active.store(false, Ordering::Release);
        // Dropping the sender wakes a worker blocked in `recv_timeout`.
        self.stop.take();
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let ticks = handle.join().map_err(|_| SimError::LoopPanicked)?;
        info!(ticks, "motion loop stopped");
        Ok(ticks)
    }
}

impl Drop for MotionLoop {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
