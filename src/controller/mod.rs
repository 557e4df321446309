//! Controller module for control-plane node auto-healing
//!
//! This module contains the reconciliation loop, the readiness
//! hysteresis, the skip check, and the cordon/taint remediation steps.

mod health;
pub mod metrics;
mod reconciler;
mod remediation;
mod skip;

pub use health::{evaluate, Decision, Thresholds};
pub use reconciler::{CycleReport, Monitor};
pub use remediation::{
    remediate, set_out_of_service, set_unschedulable, Remediation, RemediationOutcome,
};
pub use skip::is_exempt;
