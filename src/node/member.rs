//! Per-cycle snapshot of a control-plane node

use std::fmt;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Taint};
use kube::ResourceExt;

/// Status of a node's `Ready` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    True,
    False,
    Unknown,
}

impl Readiness {
    /// Parse a Kubernetes condition status; anything unrecognised is `Unknown`
    pub fn from_status(status: &str) -> Self {
        match status {
            "True" => Readiness::True,
            "False" => Readiness::False,
            _ => Readiness::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::True => "True",
            Readiness::False => "False",
            Readiness::Unknown => "Unknown",
        }
    }

    pub fn is_ready(&self) -> bool {
        *self == Readiness::True
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `Ready` condition of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyCondition {
    pub status: Readiness,
    /// Last time the condition changed status
    pub last_transition_time: DateTime<Utc>,
}

/// A control-plane node as seen at the start of one cycle
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,

    /// `None` when the node reports no usable `Ready` condition
    pub ready: Option<ReadyCondition>,

    /// Whether the node is cordoned
    pub unschedulable: bool,

    pub taints: Vec<Taint>,
}

impl Member {
    /// Build a snapshot from a Node object.
    ///
    /// A `Ready` condition without a transition time cannot be aged, so it
    /// is treated the same as a missing condition.
    pub fn from_node(node: &Node) -> Self {
        let ready = node
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conds| conds.iter().find(|c| c.type_ == "Ready"))
            .and_then(|c| {
                c.last_transition_time.as_ref().map(|t| ReadyCondition {
                    status: Readiness::from_status(&c.status),
                    last_transition_time: t.0,
                })
            });

        let spec = node.spec.as_ref();

        Self {
            name: node.name_any(),
            ready,
            unschedulable: spec.and_then(|s| s.unschedulable).unwrap_or(false),
            taints: spec.and_then(|s| s.taints.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use k8s_openapi::api::core::v1::{NodeCondition, NodeSpec, NodeStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::api::ObjectMeta;

    fn node_with_conditions(conditions: Option<Vec<NodeCondition>>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("m1".to_string()),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                unschedulable: Some(true),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                conditions,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_readiness_parsing() {
        assert_eq!(Readiness::from_status("True"), Readiness::True);
        assert_eq!(Readiness::from_status("False"), Readiness::False);
        assert_eq!(Readiness::from_status("Unknown"), Readiness::Unknown);
        assert_eq!(Readiness::from_status("true"), Readiness::Unknown);
        assert!(Readiness::True.is_ready());
        assert!(!Readiness::Unknown.is_ready());
    }

    #[test]
    fn test_from_node_picks_ready_condition() {
        let ltt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let node = node_with_conditions(Some(vec![
            NodeCondition {
                type_: "MemoryPressure".to_string(),
                status: "False".to_string(),
                ..Default::default()
            },
            NodeCondition {
                type_: "Ready".to_string(),
                status: "False".to_string(),
                last_transition_time: Some(Time(ltt)),
                ..Default::default()
            },
        ]));

        let member = Member::from_node(&node);
        assert_eq!(member.name, "m1");
        assert!(member.unschedulable);
        assert!(member.taints.is_empty());
        assert_eq!(
            member.ready,
            Some(ReadyCondition {
                status: Readiness::False,
                last_transition_time: ltt,
            })
        );
    }

    #[test]
    fn test_from_node_without_usable_ready_condition() {
        assert!(Member::from_node(&node_with_conditions(None)).ready.is_none());

        let no_time = node_with_conditions(Some(vec![NodeCondition {
            type_: "Ready".to_string(),
            status: "True".to_string(),
            last_transition_time: None,
            ..Default::default()
        }]));
        assert!(Member::from_node(&no_time).ready.is_none());
    }
}
