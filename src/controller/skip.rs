//! Exemption check for nodes carrying the skip taint

use tracing::{info, warn};

use crate::node::taints::{has_skip_taint, SKIP_TAINT_KEY, SKIP_TAINT_VALUE};
use crate::node::NodeApi;

/// Whether a node is exempt from all automation.
///
/// The node is re-read so that a skip taint added since the list call is
/// honoured. If it cannot be read the node is *not* treated as exempt and
/// goes on to evaluation.
pub async fn is_exempt(api: &dyn NodeApi, name: &str) -> bool {
    let node = match api.get_node(name).await {
        Ok(node) => node,
        Err(e) => {
            warn!(node = name, error = %e, "Could not check the skip taint, evaluating the node anyway");
            return false;
        }
    };

    let taints = node
        .spec
        .as_ref()
        .and_then(|s| s.taints.as_deref())
        .unwrap_or_default();

    if has_skip_taint(taints) {
        info!(
            node = name,
            taint_key = SKIP_TAINT_KEY,
            taint_value = SKIP_TAINT_VALUE,
            "Skip the node (Reason: Node has the Skip taint)"
        );
        return true;
    }
    false
}
