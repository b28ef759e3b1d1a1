//! Layer-load barrier.
//!
//! Every tile layer registered with the viewer reports its completion to a
//! shared [`LoadBarrier`]. Once the expected number of completions has been
//! observed the barrier fires a one-shot initializer (legend and overlay
//! construction) and publishes a [`BarrierReport`] to async waiters.
//!
//! # State Machine
//!
//! ```text
//!            notify_loaded() / notify_failed()
//!           ┌──────────────┐
//!           │              ▼
//!      ┌─────────┐   completed >= total    ┌────────┐
//!      │ Waiting │ ──────────────────────▶ │ Fired  │  (terminal)
//!      └─────────┘   or expire()           └────────┘
//! ```
//!
//! The `Waiting → Fired` transition is a compare-and-swap, so the
//! initializer runs exactly once no matter how completions interleave,
//! including completions triggered re-entrantly from inside the initializer
//! and completions racing on different threads.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::BarrierError;

/// Number of layers every exhibit registers besides its masks (main + lens).
pub const BASE_LAYER_COUNT: usize = 2;

const WAITING: u8 = 0;
const FIRED: u8 = 1;

/// Downstream work released when the barrier fires.
pub type Initializer = Box<dyn FnOnce(&BarrierReport) + Send>;

/// Observable barrier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierState {
    Waiting,
    Fired,
}

/// How failed layer loads are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// A failed layer counts toward the total and marks the report degraded.
    #[default]
    CountAsLoaded,

    /// A failed layer never counts; the barrier waits for a success that may
    /// never come.
    Stall,
}

/// Snapshot taken at the moment the barrier fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierReport {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub timed_out: bool,
}

impl BarrierReport {
    /// Whether any layer failed or the barrier was released by its deadline.
    pub fn is_degraded(&self) -> bool {
        self.failed > 0 || self.timed_out
    }
}

/// One-shot barrier counting layer completions.
pub struct LoadBarrier {
    total: usize,
    policy: FailurePolicy,

    /// Completions that count toward `total`
    completed: AtomicUsize,
    loaded: AtomicUsize,
    failed: AtomicUsize,

    state: AtomicU8,
    initializer: Mutex<Option<Initializer>>,
    fired_tx: watch::Sender<Option<BarrierReport>>,
}

impl LoadBarrier {
    /// Create a barrier waiting for `total` layers.
    pub fn new(total: usize, initializer: Initializer) -> Result<Self, BarrierError> {
        if total == 0 {
            return Err(BarrierError::ZeroLayers);
        }

        let (fired_tx, _) = watch::channel(None);
        Ok(Self {
            total,
            policy: FailurePolicy::default(),
            completed: AtomicUsize::new(0),
            loaded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            state: AtomicU8::new(WAITING),
            initializer: Mutex::new(Some(initializer)),
            fired_tx,
        })
    }

    /// Create a barrier for the base layers plus `mask_count` mask layers.
    pub fn for_layers(mask_count: usize, initializer: Initializer) -> Result<Self, BarrierError> {
        Self::new(BASE_LAYER_COUNT + mask_count, initializer)
    }

    /// Set how failed layers are counted.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Number of successful layer loads observed so far.
    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::Acquire)
    }

    /// Number of failed layer loads observed so far.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Acquire)
    }

    pub fn state(&self) -> BarrierState {
        match self.state.load(Ordering::Acquire) {
            WAITING => BarrierState::Waiting,
            _ => BarrierState::Fired,
        }
    }

    pub fn is_fired(&self) -> bool {
        self.state() == BarrierState::Fired
    }

    /// Record a successful layer load.
    ///
    /// Returns `true` if this call fired the barrier.
    pub fn notify_loaded(&self) -> bool {
        self.loaded.fetch_add(1, Ordering::AcqRel);
        self.advance()
    }

    /// Record a failed layer load.
    ///
    /// Under [`FailurePolicy::CountAsLoaded`] the failure advances the
    /// barrier. Returns `true` if this call fired the barrier.
    pub fn notify_failed(&self, layer: &str, reason: &str) -> bool {
        self.failed.fetch_add(1, Ordering::AcqRel);
        warn!(layer = layer, reason = reason, "Layer failed to load");

        match self.policy {
            FailurePolicy::CountAsLoaded => self.advance(),
            FailurePolicy::Stall => false,
        }
    }

    /// Release the barrier early, marking the report as timed out.
    ///
    /// Returns `true` if the barrier was still waiting.
    pub fn expire(&self) -> bool {
        self.try_fire(true)
    }

    /// Fire the barrier with a timed-out report if it is still waiting after
    /// `deadline`. Must be called from within a Tokio runtime.
    pub fn arm_timeout(self: &Arc<Self>, deadline: Duration) -> JoinHandle<()> {
        let barrier = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            if let Some(barrier) = barrier.upgrade() {
                if barrier.expire() {
                    warn!(
                        loaded = barrier.loaded(),
                        failed = barrier.failed(),
                        total = barrier.total,
                        "Layer loading timed out after {:?}, releasing barrier",
                        deadline
                    );
                }
            }
        })
    }

    /// Subscribe to the fire event.
    pub fn subscribe(&self) -> watch::Receiver<Option<BarrierReport>> {
        self.fired_tx.subscribe()
    }

    /// Report of the fire event, if it already happened.
    pub fn report(&self) -> Option<BarrierReport> {
        *self.fired_tx.borrow()
    }

    /// Wait until the barrier fires.
    pub async fn wait(&self) -> Result<BarrierReport, BarrierError> {
        let mut rx = self.subscribe();
        let report = rx
            .wait_for(|report| report.is_some())
            .await
            .map_err(|_| BarrierError::Closed)?;
        (*report).ok_or(BarrierError::Closed)
    }

    /// Wait until the barrier fires or `timeout` elapses.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<BarrierReport, BarrierError> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(result) => result,
            Err(_) => Err(BarrierError::TimedOut {
                loaded: self.loaded(),
                total: self.total,
            }),
        }
    }

    fn advance(&self) -> bool {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if completed >= self.total {
            self.try_fire(false)
        } else {
            debug!("Layers loaded: {}/{}", completed, self.total);
            false
        }
    }

    fn try_fire(&self, timed_out: bool) -> bool {
        if self
            .state
            .compare_exchange(WAITING, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let report = BarrierReport {
            total: self.total,
            loaded: self.loaded(),
            failed: self.failed(),
            timed_out,
        };

        if report.is_degraded() {
            warn!(
                loaded = report.loaded,
                failed = report.failed,
                timed_out = report.timed_out,
                "Load barrier fired in degraded mode"
            );
        } else {
            info!("All {} layers loaded", report.total);
        }

        // Published first: waiters are released even if the initializer
        // panics, and the initializer itself sees `report()` set.
        self.fired_tx.send_replace(Some(report));

        // The guard is released before the initializer runs so that it may
        // re-enter the barrier.
        let initializer = self
            .initializer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(initializer) = initializer {
            initializer(&report);
        }
        true
    }
}

impl fmt::Debug for LoadBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadBarrier")
            .field("total", &self.total)
            .field("loaded", &self.loaded())
            .field("failed", &self.failed())
            .field("state", &self.state())
            .field("policy", &self.policy)
            .finish()
    }
}
