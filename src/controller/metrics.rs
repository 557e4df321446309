//! Prometheus metrics for the asklepios node monitor

use once_cell::sync::Lazy;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicI64;

/// Labels identifying a node
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct NodeLabels {
    pub node: String,
}

/// Which action a countdown is heading towards
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Direction {
    Kickout,
    Kickin,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CountdownLabels {
    pub node: String,
    pub direction: Direction,
}

/// Nodes kicked out (cordoned and tainted)
pub static KICKOUTS: Lazy<Family<NodeLabels, Counter>> = Lazy::new(Family::default);

/// Nodes kicked back in (uncordoned and untainted)
pub static KICKINS: Lazy<Family<NodeLabels, Counter>> = Lazy::new(Family::default);

/// Failed cordon/taint operations
pub static ACTUATION_ERRORS: Lazy<Family<NodeLabels, Counter>> = Lazy::new(Family::default);

/// Cycles that ended early because nodes could not be listed
pub static LIST_FAILURES: Lazy<Counter> = Lazy::new(Counter::default);

/// Seconds left before a waiting node is acted on
pub static SECONDS_UNTIL_ACTION: Lazy<Family<CountdownLabels, Gauge<i64, AtomicI64>>> =
    Lazy::new(Family::default);

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::default();
    registry.register(
        "asklepios_kickouts",
        "Number of times a control-plane node was kicked out",
        KICKOUTS.clone(),
    );
    registry.register(
        "asklepios_kickins",
        "Number of times a control-plane node was kicked back in",
        KICKINS.clone(),
    );
    registry.register(
        "asklepios_actuation_errors",
        "Number of failed cordon or taint operations",
        ACTUATION_ERRORS.clone(),
    );
    registry.register(
        "asklepios_list_failures",
        "Number of cycles where control-plane nodes could not be listed",
        LIST_FAILURES.clone(),
    );
    registry.register(
        "asklepios_seconds_until_action",
        "Seconds remaining before a node is kicked out or kicked in",
        SECONDS_UNTIL_ACTION.clone(),
    );
    registry
});

fn node_labels(node: &str) -> NodeLabels {
    NodeLabels {
        node: node.to_string(),
    }
}

pub fn inc_kickouts(node: &str) {
    KICKOUTS.get_or_create(&node_labels(node)).inc();
}

pub fn inc_kickins(node: &str) {
    KICKINS.get_or_create(&node_labels(node)).inc();
}

pub fn inc_actuation_errors(node: &str) {
    ACTUATION_ERRORS.get_or_create(&node_labels(node)).inc();
}

pub fn inc_list_failures() {
    LIST_FAILURES.inc();
}

fn countdown(node: &str, direction: Direction) -> Gauge<i64, AtomicI64> {
    SECONDS_UNTIL_ACTION
        .get_or_create(&CountdownLabels {
            node: node.to_string(),
            direction,
        })
        .clone()
}

/// Current countdown of a node towards `direction`
pub fn seconds_until_action(node: &str, direction: Direction) -> i64 {
    countdown(node, direction).get()
}

/// Record the countdown for a node, clearing the opposite direction
pub fn set_seconds_until_action(node: &str, direction: Direction, seconds: i64) {
    let other = match direction {
        Direction::Kickout => Direction::Kickin,
        Direction::Kickin => Direction::Kickout,
    };
    countdown(node, other).set(0);
    countdown(node, direction).set(seconds);
}

/// Reset both countdowns once a node is acted on or skipped
pub fn clear_seconds_until_action(node: &str) {
    countdown(node, Direction::Kickout).set(0);
    countdown(node, Direction::Kickin).set(0);
}
