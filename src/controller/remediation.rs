//! Isolation and restoration of control-plane nodes
//!
//! Isolating a node means cordoning it and adding the out-of-service
//! taint, in that order, so nothing new is scheduled while the taint is
//! written. Restoring reverses both steps in reverse order.
//!
//! Each step re-reads the node right before changing it and only writes
//! when the current state differs from the desired one, so repeating a
//! step is harmless and concurrent edits by other actors are respected.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::Result;
use crate::node::taints::{
    has_out_of_service_taint, with_out_of_service_taint, without_out_of_service_taint,
};
use crate::node::NodeApi;

/// Which way a node is being moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    Isolate,
    Restore,
}

impl Remediation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Remediation::Isolate => "Isolate",
            Remediation::Restore => "Restore",
        }
    }
}

/// Outcome of each step of a remediation; `Ok(true)` means the node was changed
#[derive(Debug)]
pub struct RemediationOutcome {
    pub cordon: Result<bool>,
    pub taint: Result<bool>,
}

impl RemediationOutcome {
    pub fn changed(&self) -> bool {
        matches!(self.cordon, Ok(true)) || matches!(self.taint, Ok(true))
    }

    pub fn succeeded(&self) -> bool {
        self.cordon.is_ok() && self.taint.is_ok()
    }
}

/// Cordon (`true`) or uncordon (`false`) a node if it is not already in that state
pub async fn set_unschedulable(api: &dyn NodeApi, name: &str, unschedulable: bool) -> Result<bool> {
    let node = api.get_node(name).await?;
    let current = node
        .spec
        .as_ref()
        .and_then(|s| s.unschedulable)
        .unwrap_or(false);

    if current == unschedulable {
        debug!(node = name, unschedulable, "Node already in the desired scheduling state");
        return Ok(false);
    }

    api.patch_unschedulable(name, unschedulable).await?;

    let action = if unschedulable {
        "Make the node unschedulable"
    } else {
        "Make the node schedulable"
    };
    info!(node = name, action, "Succeeded to process the node");
    Ok(true)
}

/// Add (`true`) or remove (`false`) the out-of-service taint if needed.
///
/// Other taints on the node are left untouched.
pub async fn set_out_of_service(api: &dyn NodeApi, name: &str, present: bool) -> Result<bool> {
    let mut node = api.get_node(name).await?;
    let spec = node.spec.get_or_insert_with(Default::default);
    let taints = spec.taints.take().unwrap_or_default();

    if has_out_of_service_taint(&taints) == present {
        debug!(node = name, present, "Out-of-service taint already in the desired state");
        return Ok(false);
    }

    let (updated, action) = if present {
        (
            with_out_of_service_taint(&taints, Utc::now()),
            "Add the out-of-service taint",
        )
    } else {
        (
            without_out_of_service_taint(&taints),
            "Remove the out-of-service taint",
        )
    };
    spec.taints = if updated.is_empty() { None } else { Some(updated) };

    api.replace_node(&node).await?;
    info!(node = name, action, "Succeeded to process the node");
    Ok(true)
}

/// Run both steps of a remediation in the required order.
///
/// The second step runs even if the first fails; each outcome is reported
/// separately.
pub async fn remediate(api: &dyn NodeApi, name: &str, remediation: Remediation) -> RemediationOutcome {
    match remediation {
        Remediation::Isolate => {
            let cordon = set_unschedulable(api, name, true).await;
            let taint = set_out_of_service(api, name, true).await;
            RemediationOutcome { cordon, taint }
        }
        Remediation::Restore => {
            let taint = set_out_of_service(api, name, false).await;
            let cordon = set_unschedulable(api, name, false).await;
            RemediationOutcome { cordon, taint }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_remediation_as_str() {
        assert_eq!(Remediation::Isolate.as_str(), "Isolate");
        assert_eq!(Remediation::Restore.as_str(), "Restore");
    }

    #[test]
    fn test_outcome_flags() {
        let outcome = RemediationOutcome {
            cordon: Ok(false),
            taint: Ok(true),
        };
        assert!(outcome.changed());
        assert!(outcome.succeeded());

        let outcome = RemediationOutcome {
            cordon: Err(Error::ConfigError("boom".to_string())),
            taint: Ok(false),
        };
        assert!(!outcome.changed());
        assert!(!outcome.succeeded());
    }
}
