//! Cluster node model and API access
//!
//! This module turns Kubernetes `Node` objects into the per-cycle
//! [`Member`] snapshots the controller evaluates, defines the taints the
//! monitor reads and writes, and exposes the [`NodeApi`] capability the
//! controller uses to talk to the cluster.

mod client;
mod member;
pub mod taints;

pub use client::{KubeNodeApi, NodeApi, CONTROL_PLANE_SELECTOR};
pub use member::{Member, ReadyCondition, Readiness};
