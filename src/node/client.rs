//! Access to Node objects in the cluster

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, Node};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{
    api::{Api, ListParams, Patch, PatchParams, PostParams},
    Client, Resource, ResourceExt,
};
use tracing::debug;

use crate::error::{Error, Result};

/// Label selector matching control-plane nodes
pub const CONTROL_PLANE_SELECTOR: &str = "node-role.kubernetes.io/control-plane=";

/// Field manager recorded on patches
const FIELD_MANAGER: &str = "asklepios";

/// Namespace Node events are recorded in
const EVENT_NAMESPACE: &str = "default";

/// Cluster operations the controller depends on
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// List nodes matching a label selector
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>>;

    /// Fetch the current state of one node
    async fn get_node(&self, name: &str) -> Result<Node>;

    /// Set `spec.unschedulable` and nothing else
    async fn patch_unschedulable(&self, name: &str, unschedulable: bool) -> Result<()>;

    /// Write back a modified node; fails if it changed since it was read
    async fn replace_node(&self, node: &Node) -> Result<()>;

    /// Record a Kubernetes Event against a node
    async fn emit_event(
        &self,
        node: &Node,
        event_type: &str,
        reason: &str,
        message: &str,
    ) -> Result<()>;
}

/// [`NodeApi`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeNodeApi {
    client: Client,
}

impl KubeNodeApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn nodes(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl NodeApi for KubeNodeApi {
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>> {
        let nodes = self
            .nodes()
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(Error::KubeError)?;
        debug!(selector = label_selector, count = nodes.items.len(), "Listed nodes");
        Ok(nodes.items)
    }

    async fn get_node(&self, name: &str) -> Result<Node> {
        let node = self.nodes().get_opt(name).await.map_err(Error::KubeError)?;
        debug!(node = name, "Got the node object");
        node.ok_or_else(|| Error::NotFound {
            kind: "Node".to_string(),
            name: name.to_string(),
        })
    }

    async fn patch_unschedulable(&self, name: &str, unschedulable: bool) -> Result<()> {
        let patch = serde_json::json!({
            "spec": {
                "unschedulable": unschedulable
            }
        });

        self.nodes()
            .patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(Error::KubeError)?;
        Ok(())
    }

    async fn replace_node(&self, node: &Node) -> Result<()> {
        self.nodes()
            .replace(&node.name_any(), &PostParams::default(), node)
            .await
            .map_err(Error::KubeError)?;
        Ok(())
    }

    async fn emit_event(
        &self,
        node: &Node,
        event_type: &str,
        reason: &str,
        message: &str,
    ) -> Result<()> {
        let events: Api<Event> = Api::namespaced(self.client.clone(), EVENT_NAMESPACE);

        let time = chrono::Utc::now();
        let event = Event {
            metadata: kube::api::ObjectMeta {
                generate_name: Some(format!("{}-asklepios-", node.name_any())),
                namespace: Some(EVENT_NAMESPACE.to_string()),
                ..Default::default()
            },
            type_: Some(event_type.to_string()),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            involved_object: node.object_ref(&()),
            first_timestamp: Some(Time(time)),
            last_timestamp: Some(Time(time)),
            count: Some(1),
            ..Default::default()
        };

        events
            .create(&PostParams::default(), &event)
            .await
            .map_err(Error::KubeError)?;
        Ok(())
    }
}
