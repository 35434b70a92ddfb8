//! Worker pool that runs matched actions off the hook thread.
//!
//! Jobs are handed over through a zero-capacity channel, so a submission
//! succeeds only if a worker is idle right now or a new one may be started.
//! Nothing is ever queued: once `max_workers` are busy further jobs are
//! rejected, since a macro action that runs late is worse than one that
//! does not run.
//!
//! "Idle" means parked in `recv`. A worker that has just finished a job but
//! not yet looped back to wait counts as busy, so a tight burst of
//! submissions can be rejected even though the pool is not really
//! saturated; expect `rejected` to climb under bursts well below
//! `max_workers` concurrent actions.
//!
//! Workers beyond `min_workers` exit after sitting idle for `keep_alive`.
//! A failing or panicking job is logged and counted; it never takes its worker
//! down.
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{self as chan, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::{Error, Result, config::ExecutorConfig};

/// A unit of work with the label used when logging its outcome.
struct Job {
    label: Arc<str>,
    run: Box<dyn FnOnce() -> Result<()> + Send>,
}

/// Counters describing pool activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Workers currently alive.
    pub live: usize,
    /// Highest number of workers alive at once.
    pub peak: usize,
    /// Jobs refused because the pool was saturated.
    pub rejected: u64,
    /// Jobs that returned `Ok` or were interrupted by shutdown.
    pub completed: u64,
    /// Jobs that returned an error or panicked.
    pub failed: u64,
}

/// State shared with worker threads.
struct Shared {
    cfg: ExecutorConfig,
    jobs: Receiver<Job>,
    live: AtomicUsize,
    peak: AtomicUsize,
    rejected: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    next_id: AtomicUsize,
    /// Signalled whenever `live` drops to zero.
    drained: (Mutex<()>, Condvar),
}

impl Shared {
    /// Reserve a worker slot if below `limit`.
    fn reserve_slot(&self, limit: usize) -> bool {
        let mut cur = self.live.load(Ordering::SeqCst);
        loop {
            if cur >= limit {
                return false;
            }
            match self
                .live
                .compare_exchange(cur, cur + 1, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    self.peak.fetch_max(cur + 1, Ordering::SeqCst);
                    return true;
                }
                Err(actual) => cur = actual,
            }
        }
    }

    /// Give up a slot if more than `min_workers` are alive.
    fn try_retire(&self) -> bool {
        let mut cur = self.live.load(Ordering::SeqCst);
        loop {
            if cur <= self.cfg.min_workers {
                return false;
            }
            match self
                .live
                .compare_exchange(cur, cur - 1, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    self.notify_if_drained(cur - 1);
                    return true;
                }
                Err(actual) => cur = actual,
            }
        }
    }

    fn release_slot(&self) {
        let prev = self.live.fetch_sub(1, Ordering::SeqCst);
        self.notify_if_drained(prev - 1);
    }

    fn notify_if_drained(&self, now: usize) {
        if now == 0 {
            let _g = self.drained.0.lock();
            self.drained.1.notify_all();
        }
    }

    fn run(&self, job: Job) {
        let Job { label, run } = job;
        trace!(rule = %label, "action_started");
        match panic::catch_unwind(AssertUnwindSafe(run)) {
            Ok(Ok(())) => {
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Err(Error::Interrupted)) => {
                debug!(rule = %label, "action_interrupted");
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Err(e)) => {
                warn!(rule = %label, error = %e, "action_failed");
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
            Err(_) => {
                warn!(rule = %label, "action_panicked");
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

fn worker_loop(shared: &Shared, first: Option<Job>) {
    if shared.cfg.elevated_priority {
        raise_priority();
    }
    if let Some(job) = first {
        shared.run(job);
    }
    let keep_alive = shared.cfg.keep_alive();
    loop {
        match shared.jobs.recv_timeout(keep_alive) {
            Ok(job) => shared.run(job),
            Err(RecvTimeoutError::Timeout) => {
                if shared.try_retire() {
                    trace!("worker_retired");
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    shared.release_slot();
}

#[cfg(windows)]
fn raise_priority() {
    use windows::Win32::System::Threading::{
        GetCurrentThread, SetThreadPriority, THREAD_PRIORITY_HIGHEST,
    };
    if let Err(e) = unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_HIGHEST) } {
        debug!(error = %e, "worker_priority_not_raised");
    }
}

#[cfg(not(windows))]
fn raise_priority() {}

/// Bounded action pool. Clones share the same workers.
#[derive(Clone)]
pub struct Executor {
    shared: Arc<Shared>,
    /// Dropped on shutdown; idle workers then exit.
    jobs: Arc<Mutex<Option<Sender<Job>>>>,
    /// Dropped on shutdown; interrupts waits inside running actions.
    cancel_tx: Arc<Mutex<Option<Sender<()>>>>,
    cancel_rx: Receiver<()>,
    accepting: Arc<AtomicBool>,
}

impl Executor {
    /// Start a pool with `cfg.min_workers` warm workers.
    pub fn new(cfg: ExecutorConfig) -> Result<Self> {
        let (job_tx, job_rx) = chan::bounded::<Job>(0);
        let (cancel_tx, cancel_rx) = chan::bounded::<()>(0);
        let warm = cfg.min_workers;
        let exec = Self {
            shared: Arc::new(Shared {
                cfg,
                jobs: job_rx,
                live: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                rejected: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                next_id: AtomicUsize::new(0),
                drained: (Mutex::new(()), Condvar::new()),
            }),
            jobs: Arc::new(Mutex::new(Some(job_tx))),
            cancel_tx: Arc::new(Mutex::new(Some(cancel_tx))),
            cancel_rx,
            accepting: Arc::new(AtomicBool::new(true)),
        };
        for _ in 0..warm {
            if !exec.shared.reserve_slot(warm) {
                break;
            }
            exec.spawn_worker(None)?;
        }
        debug!(warm, max = exec.shared.cfg.max_workers, "executor_started");
        Ok(exec)
    }

    /// Run `f` on a worker.
    ///
    /// Returns [`Error::Rejected`] if every worker is busy and the pool is at
    /// its cap, or [`Error::ShutDown`] after [`Executor::shutdown`].
    pub fn submit<F>(&self, label: impl Into<Arc<str>>, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(Error::ShutDown);
        }
        let job = Job {
            label: label.into(),
            run: Box::new(f),
        };
        let sender = match self.jobs.lock().as_ref() {
            Some(tx) => tx.clone(),
            None => return Err(Error::ShutDown),
        };
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(Error::ShutDown),
            Err(TrySendError::Full(job)) => {
                if self.shared.reserve_slot(self.shared.cfg.max_workers) {
                    self.spawn_worker(Some(job))
                } else {
                    self.shared.rejected.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        rule = %job.label,
                        max = self.shared.cfg.max_workers,
                        "action_rejected_pool_saturated"
                    );
                    Err(Error::Rejected)
                }
            }
        }
    }

    /// Start a worker for a slot already reserved.
    fn spawn_worker(&self, first: Option<Job>) -> Result<()> {
        let shared = self.shared.clone();
        let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
        let spawned = thread::Builder::new()
            .name(format!("macro-action-{}", id))
            .spawn(move || worker_loop(&shared, first));
        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                self.shared.release_slot();
                warn!(error = %e, "worker_spawn_failed");
                Err(Error::Spawn(e))
            }
        }
    }

    /// Receiver that disconnects on shutdown. Actions wait on it to be
    /// interruptible.
    pub fn cancel_signal(&self) -> Receiver<()> {
        self.cancel_rx.clone()
    }

    /// Stop accepting jobs, interrupt waiting actions and let idle workers exit.
    ///
    /// Does not wait: an action that ignores interruption runs to completion.
    pub fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }
        self.jobs.lock().take();
        self.cancel_tx.lock().take();
        debug!("executor_shutdown");
    }

    /// True until [`Executor::shutdown`].
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Block until every worker has exited or `timeout` passes.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &self.shared.drained;
        let mut g = lock.lock();
        let deadline = Instant::now() + timeout;
        while self.shared.live.load(Ordering::SeqCst) > 0 {
            if cvar.wait_until(&mut g, deadline).timed_out() {
                return self.shared.live.load(Ordering::SeqCst) == 0;
            }
        }
        true
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> ExecutorStats {
        let s = &self.shared;
        ExecutorStats {
            live: s.live.load(Ordering::SeqCst),
            peak: s.peak.load(Ordering::SeqCst),
            rejected: s.rejected.load(Ordering::SeqCst),
            completed: s.completed.load(Ordering::SeqCst),
            failed: s.failed.load(Ordering::SeqCst),
        }
    }
}
