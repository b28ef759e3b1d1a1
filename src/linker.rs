//! Leader/follower pan-zoom linking between two viewers.
//!
//! When either viewer of a linked pair zooms or pans, the other one is
//! moved to the same zoom and center. The viewer being driven by the user
//! is the *leader*; while it relays, events echoed back by the follower are
//! ignored, so every user action results in exactly one setter call per
//! property on the follower and none on the leader.
//!
//! ```text
//!   A: zoom ──▶ relay(A→B) ── a_leading = true
//!                  │
//!                  ├─▶ B.zoom_to(A.zoom())  ──▶ B: zoom ──▶ relay(B→A): a_leading, skip
//!                  ├─▶ B.pan_to(A.center()) ──▶ B: pan  ──▶ relay(B→A): a_leading, skip
//!                  │
//!               a_leading = false
//! ```
//!
//! The second viewer usually lives in another window that finishes loading
//! later. [`ViewerLinker::handshake`] returns the two halves of that
//! rendezvous: a [`ViewerOffer`] the new instance resolves once its viewer
//! exists, and a [`PendingLink`] the first instance awaits.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, trace};

use crate::error::LinkError;
use crate::viewer::{Viewer, ViewerEventKind};

/// One viewer of a linked pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Anti-echo flags of a linked pair.
///
/// Shared by the two directional handlers and only mutated inside them.
#[derive(Debug, Default)]
pub struct LinkState {
    a_leading: AtomicBool,
    b_leading: AtomicBool,
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, side: Side) -> &AtomicBool {
        match side {
            Side::A => &self.a_leading,
            Side::B => &self.b_leading,
        }
    }

    /// Whether `side` is currently relaying to its peer.
    pub fn is_leading(&self, side: Side) -> bool {
        self.flag(side).load(Ordering::Acquire)
    }

    /// Whether either side is currently relaying.
    pub fn is_relaying(&self) -> bool {
        self.is_leading(Side::A) || self.is_leading(Side::B)
    }
}

/// Clears a leading flag when the relay scope ends, including on unwind.
struct LeadGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LeadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self { flag }
    }
}

impl Drop for LeadGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Copy `leader`'s zoom and center onto `follower`, unless the event is an
/// echo of the follower leading. Returns `true` if the follower was moved.
pub fn relay(state: &LinkState, side: Side, leader: &dyn Viewer, follower: &dyn Viewer) -> bool {
    if state.is_leading(side.other()) {
        trace!(?side, "Ignoring echoed viewport event");
        return false;
    }

    let _guard = LeadGuard::acquire(state.flag(side));
    follower.zoom_to(leader.zoom());
    follower.pan_to(leader.center());
    true
}

/// Wires viewers into mutually-following pairs.
pub struct ViewerLinker;

impl ViewerLinker {
    /// Link `a` and `b` so that each follows the other's pan and zoom.
    ///
    /// Handlers hold weak references; the pair stops relaying once either
    /// viewer is dropped.
    pub fn link(a: &Arc<dyn Viewer>, b: &Arc<dyn Viewer>) -> LinkedPair {
        let state = Arc::new(LinkState::new());
        install(&state, Side::A, a, b);
        install(&state, Side::B, b, a);
        debug!("Linked viewer pair");

        LinkedPair {
            state,
            a: Arc::downgrade(a),
            b: Arc::downgrade(b),
        }
    }

    /// Start a link with a viewer that does not exist yet.
    pub fn handshake() -> (ViewerOffer, PendingLink) {
        let (tx, rx) = oneshot::channel();
        (ViewerOffer { tx }, PendingLink { rx })
    }
}

fn install(
    state: &Arc<LinkState>,
    side: Side,
    leader: &Arc<dyn Viewer>,
    follower: &Arc<dyn Viewer>,
) {
    for event in [ViewerEventKind::Zoom, ViewerEventKind::Pan] {
        let state = Arc::clone(state);
        let leader_ref = Arc::downgrade(leader);
        let follower_ref = Arc::downgrade(follower);

        leader.add_handler(
            event,
            Arc::new(move |_: ViewerEventKind| {
                let (Some(leader), Some(follower)) = (leader_ref.upgrade(), follower_ref.upgrade())
                else {
                    return;
                };
                relay(&state, side, leader.as_ref(), follower.as_ref());
            }),
        );
    }
}

/// A linked pair of viewers.
pub struct LinkedPair {
    state: Arc<LinkState>,
    a: Weak<dyn Viewer>,
    b: Weak<dyn Viewer>,
}

impl LinkedPair {
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Whether a relay is in progress.
    pub fn is_relaying(&self) -> bool {
        self.state.is_relaying()
    }

    /// Whether both viewers are still alive.
    pub fn is_open(&self) -> bool {
        self.a.strong_count() > 0 && self.b.strong_count() > 0
    }
}

impl fmt::Debug for LinkedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedPair")
            .field("state", &self.state)
            .field("open", &self.is_open())
            .finish()
    }
}

/// The second instance's half of a handshake.
pub struct ViewerOffer {
    tx: oneshot::Sender<Arc<dyn Viewer>>,
}

impl ViewerOffer {
    /// Hand the freshly created viewer to the waiting instance.
    ///
    /// Fails with [`LinkError::PeerClosed`] if the waiting side gave up.
    pub fn ready(self, viewer: Arc<dyn Viewer>) -> Result<(), LinkError> {
        self.tx.send(viewer).map_err(|_| LinkError::PeerClosed)
    }
}

/// The first instance's half of a handshake.
pub struct PendingLink {
    rx: oneshot::Receiver<Arc<dyn Viewer>>,
}

impl PendingLink {
    /// Wait for the peer viewer and link it to `leader`.
    ///
    /// The peer instance keeps ownership of its viewer.
    pub async fn link(self, leader: &Arc<dyn Viewer>) -> Result<LinkedPair, LinkError> {
        let follower = self.rx.await.map_err(|_| LinkError::PeerClosed)?;
        info!("Peer viewer ready, linking pan and zoom");
        Ok(ViewerLinker::link(leader, &follower))
    }

    /// Like [`link`](Self::link), giving up after `timeout`.
    pub async fn link_timeout(
        self,
        leader: &Arc<dyn Viewer>,
        timeout: Duration,
    ) -> Result<LinkedPair, LinkError> {
        match tokio::time::timeout(timeout, self.link(leader)).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::TimedOut(saturating_millis(timeout))),
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
