//! The reconciliation loop
//!
//! One cycle lists the control-plane nodes, drops exempt ones, evaluates
//! the rest against the cycle's thresholds and remediates where needed.
//! Faults never stop the loop: a failed list ends the cycle early, and a
//! failed step on one node does not affect the others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::node::{Member, NodeApi, CONTROL_PLANE_SELECTOR};

use super::health::{evaluate, Decision, Thresholds};
use super::metrics::{self, Direction};
use super::remediation::{remediate, Remediation, RemediationOutcome};
use super::skip::is_exempt;

/// Tally of what happened in one cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Nodes returned by the list call
    pub listed: usize,
    pub skipped: usize,
    /// Nodes without a usable `Ready` condition
    pub no_condition: usize,
    pub waiting: usize,
    pub isolated: usize,
    pub restored: usize,
    /// Failed cordon/taint steps
    pub failures: usize,
}

/// Everything the loop needs, built once at startup
pub struct Monitor {
    api: Arc<dyn NodeApi>,
    settings: Settings,
}

impl Monitor {
    pub fn new(api: Arc<dyn NodeApi>, settings: Settings) -> Self {
        Self { api, settings }
    }

    /// Run cycles forever, sleeping the poll interval after each one
    pub async fn run(&self) {
        let interval = self.settings.poll_interval();
        info!(
            sleep = self.settings.sleep,
            kickout = self.settings.kickout,
            kickin = self.settings.kickin,
            "Asklepios service is starting"
        );

        loop {
            match self.run_cycle(Utc::now()).await {
                Ok(report) => debug!(?report, "Cycle complete"),
                Err(e) => {
                    metrics::inc_list_failures();
                    error!(error = %e, "Failed to list control-plane nodes");
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Run a single cycle at `now`.
    ///
    /// Only a failure to list nodes is returned; per-node faults are logged
    /// and counted in the report.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let nodes = self.api.list_nodes(CONTROL_PLANE_SELECTOR).await?;
        let thresholds = Thresholds::at(now, &self.settings);

        let mut report = CycleReport {
            listed: nodes.len(),
            ..Default::default()
        };

        for node in &nodes {
            self.process_node(node, &thresholds, &mut report).await;
        }

        Ok(report)
    }

    #[instrument(skip_all, fields(node = %node.name_any()))]
    async fn process_node(&self, node: &Node, thresholds: &Thresholds, report: &mut CycleReport) {
        let member = Member::from_node(node);

        let decision = if is_exempt(self.api.as_ref(), &member.name).await {
            Decision::Skip
        } else {
            match evaluate(&member, thresholds) {
                Some(decision) => decision,
                None => {
                    debug!(node = %member.name, "Node has no Ready condition, nothing to do");
                    report.no_condition += 1;
                    return;
                }
            }
        };

        let status = member
            .ready
            .as_ref()
            .map(|r| r.status.as_str())
            .unwrap_or("Unknown");
        let ready = member.ready.as_ref().is_some_and(|r| r.status.is_ready());

        match decision {
            Decision::Skip => {
                report.skipped += 1;
                metrics::clear_seconds_until_action(&member.name);
            }
            Decision::Wait(remaining) => {
                report.waiting += 1;
                let seconds = remaining.num_seconds();
                if ready {
                    metrics::set_seconds_until_action(&member.name, Direction::Kickin, seconds);
                    info!(
                        node = %member.name,
                        status,
                        kicked_in = false,
                        time_to_kick_in = seconds,
                        "Node is ready"
                    );
                } else {
                    metrics::set_seconds_until_action(&member.name, Direction::Kickout, seconds);
                    info!(
                        node = %member.name,
                        status,
                        kicked_out = false,
                        time_to_kick_out = seconds,
                        "Node is not ready"
                    );
                }
            }
            Decision::Isolate => {
                info!(node = %member.name, status, kicked_out = true, "Node is not ready");
                metrics::clear_seconds_until_action(&member.name);
                let outcome = remediate(self.api.as_ref(), &member.name, Remediation::Isolate).await;
                if outcome.changed() {
                    report.isolated += 1;
                    metrics::inc_kickouts(&member.name);
                }
                self.finish(node, &member.name, Remediation::Isolate, &outcome, report)
                    .await;
            }
            Decision::Restore => {
                info!(node = %member.name, status, kicked_in = true, "Node is ready");
                metrics::clear_seconds_until_action(&member.name);
                let outcome = remediate(self.api.as_ref(), &member.name, Remediation::Restore).await;
                if outcome.changed() {
                    report.restored += 1;
                    metrics::inc_kickins(&member.name);
                }
                self.finish(node, &member.name, Remediation::Restore, &outcome, report)
                    .await;
            }
        }
    }

    /// Log step failures and record an Event when the node was changed
    async fn finish(
        &self,
        node: &Node,
        name: &str,
        remediation: Remediation,
        outcome: &RemediationOutcome,
        report: &mut CycleReport,
    ) {
        for (step, result) in [("cordon", &outcome.cordon), ("taint", &outcome.taint)] {
            if let Err(e) = result {
                report.failures += 1;
                metrics::inc_actuation_errors(name);
                error!(
                    node = name,
                    step,
                    action = remediation.as_str(),
                    error = %e,
                    "Failed to process the node"
                );
            }
        }

        if !self.settings.emit_events || !outcome.changed() {
            return;
        }

        let (event_type, reason, message) = match remediation {
            Remediation::Isolate => (
                "Warning",
                "NodeKickedOut",
                format!(
                    "Node was not ready for more than {}s; cordoned and tainted out-of-service",
                    self.settings.kickout
                ),
            ),
            Remediation::Restore => (
                "Normal",
                "NodeKickedIn",
                format!(
                    "Node was ready for more than {}s; out-of-service taint removed and uncordoned",
                    self.settings.kickin
                ),
            ),
        };

        if let Err(e) = self.api.emit_event(node, event_type, reason, &message).await {
            warn!(node = name, reason, error = %e, "Failed to emit event");
        }
    }
}
