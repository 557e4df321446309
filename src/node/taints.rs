//! Taints read and written by the monitor
//!
//! Two taints matter:
//! - the skip taint, placed by operators to exempt a node from all
//!   automation (never written here)
//! - the out-of-service taint, added on kickout and removed on kickin

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Taint;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

/// Key of the taint that exempts a node from automation
pub const SKIP_TAINT_KEY: &str = "node.kubernetes.io/asklepios";
/// Value the skip taint must carry
pub const SKIP_TAINT_VALUE: &str = "skip";

/// Key of the out-of-service taint
pub const OUT_OF_SERVICE_TAINT_KEY: &str = "node.kubernetes.io/out-of-service";
/// Value of the out-of-service taint
pub const OUT_OF_SERVICE_TAINT_VALUE: &str = "nodeshutdown";

/// Effect that blocks scheduling and evicts running pods
pub const EFFECT_NO_EXECUTE: &str = "NoExecute";

/// The out-of-service taint stamped with `now`
pub fn out_of_service_taint(now: DateTime<Utc>) -> Taint {
    Taint {
        key: OUT_OF_SERVICE_TAINT_KEY.to_string(),
        value: Some(OUT_OF_SERVICE_TAINT_VALUE.to_string()),
        effect: EFFECT_NO_EXECUTE.to_string(),
        time_added: Some(Time(now)),
    }
}

/// Whether the taint set carries the skip taint (matched by key and value)
pub fn has_skip_taint(taints: &[Taint]) -> bool {
    taints
        .iter()
        .any(|t| t.key == SKIP_TAINT_KEY && t.value.as_deref() == Some(SKIP_TAINT_VALUE))
}

/// Taints are identified by key and effect, as the API server does
fn is_out_of_service(taint: &Taint) -> bool {
    taint.key == OUT_OF_SERVICE_TAINT_KEY && taint.effect == EFFECT_NO_EXECUTE
}

/// Whether the taint set carries the out-of-service taint
pub fn has_out_of_service_taint(taints: &[Taint]) -> bool {
    taints.iter().any(is_out_of_service)
}

/// Copy of `taints` with the out-of-service taint added (or refreshed)
pub fn with_out_of_service_taint(taints: &[Taint], now: DateTime<Utc>) -> Vec<Taint> {
    let mut updated: Vec<Taint> = taints
        .iter()
        .filter(|t| !is_out_of_service(t))
        .cloned()
        .collect();
    updated.push(out_of_service_taint(now));
    updated
}

/// Copy of `taints` with only the out-of-service taint removed
pub fn without_out_of_service_taint(taints: &[Taint]) -> Vec<Taint> {
    taints
        .iter()
        .filter(|t| !is_out_of_service(t))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn taint(key: &str, value: Option<&str>, effect: &str) -> Taint {
        Taint {
            key: key.to_string(),
            value: value.map(str::to_string),
            effect: effect.to_string(),
            time_added: None,
        }
    }

    #[test]
    fn test_skip_taint_matches_key_and_value() {
        assert!(has_skip_taint(&[taint(SKIP_TAINT_KEY, Some("skip"), "NoExecute")]));
        assert!(has_skip_taint(&[taint(SKIP_TAINT_KEY, Some("skip"), "NoSchedule")]));
        assert!(!has_skip_taint(&[taint(SKIP_TAINT_KEY, Some("no"), "NoExecute")]));
        assert!(!has_skip_taint(&[taint(SKIP_TAINT_KEY, None, "NoExecute")]));
        assert!(!has_skip_taint(&[]));
    }

    #[test]
    fn test_out_of_service_taint_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t = out_of_service_taint(now);
        assert_eq!(t.key, "node.kubernetes.io/out-of-service");
        assert_eq!(t.value.as_deref(), Some("nodeshutdown"));
        assert_eq!(t.effect, "NoExecute");
        assert_eq!(t.time_added, Some(Time(now)));
    }

    #[test]
    fn test_add_and_remove_leave_other_taints_alone() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let others = vec![
            taint("node-role.kubernetes.io/control-plane", None, "NoSchedule"),
            taint(OUT_OF_SERVICE_TAINT_KEY, Some("nodeshutdown"), "NoSchedule"),
        ];

        let added = with_out_of_service_taint(&others, now);
        assert_eq!(added.len(), 3);
        assert!(has_out_of_service_taint(&added));
        assert_eq!(&added[..2], &others[..]);

        let removed = without_out_of_service_taint(&added);
        assert_eq!(removed, others);
        assert!(!has_out_of_service_taint(&removed));
    }

    #[test]
    fn test_add_replaces_existing_out_of_service_taint() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let existing = vec![taint(OUT_OF_SERVICE_TAINT_KEY, Some("old"), "NoExecute")];

        let added = with_out_of_service_taint(&existing, now);
        assert_eq!(added, vec![out_of_service_taint(now)]);
    }
}
