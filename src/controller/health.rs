//! Readiness hysteresis for control-plane nodes
//!
//! A node is only acted on once its `Ready` condition has held the same
//! status for longer than the configured delay:
//!
//! - **Not ready** for longer than `kickout` → [`Decision::Isolate`]
//! - **Ready** for longer than `kickin` → [`Decision::Restore`]
//! - Otherwise → [`Decision::Wait`] with the time left before acting
//!
//! Nothing is remembered between cycles. Every decision is recomputed from
//! the condition's last transition time, which the API server persists.

use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::config::Settings;
use crate::node::Member;

/// Outcome of evaluating one node in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Cordon the node, then taint it out-of-service
    Isolate,
    /// Remove the out-of-service taint, then uncordon the node
    Restore,
    /// Not yet; the threshold is crossed after `remaining`
    Wait(Duration),
    /// The node is exempt from automation
    Skip,
}

impl Decision {
    pub fn is_actionable(&self) -> bool {
        matches!(self, Decision::Isolate | Decision::Restore)
    }
}

/// Cut-off timestamps shared by every node in a cycle.
///
/// A transition older than a cut-off means the node has been in its
/// current state longer than the matching delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub kickout: DateTime<Utc>,
    pub kickin: DateTime<Utc>,
}

impl Thresholds {
    /// Compute cut-offs at `now`, at whole-second resolution.
    ///
    /// A delay reaching past the earliest representable time clamps the
    /// cut-off there, so no transition is old enough to act on.
    pub fn at(now: DateTime<Utc>, settings: &Settings) -> Self {
        let now = now.trunc_subsecs(0);
        let cutoff = |delay: Duration| {
            now.checked_sub_signed(delay)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };
        Self {
            kickout: cutoff(settings.kickout_delay()),
            kickin: cutoff(settings.kickin_delay()),
        }
    }
}

/// Map a non-exempt node to a decision.
///
/// Returns `None` when the node has no `Ready` condition: such a node is
/// neither healthy nor unhealthy under this policy.
pub fn evaluate(member: &Member, thresholds: &Thresholds) -> Option<Decision> {
    let ready = member.ready.as_ref()?;
    let ltt = ready.last_transition_time;

    let threshold = if ready.status.is_ready() {
        thresholds.kickin
    } else {
        thresholds.kickout
    };

    if ltt < threshold {
        Some(if ready.status.is_ready() {
            Decision::Restore
        } else {
            Decision::Isolate
        })
    } else {
        Some(Decision::Wait(ltt - threshold))
    }
}
