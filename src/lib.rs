//! asklepios: auto-healing for Kubernetes control-plane nodes
//!
//! Watches the `Ready` condition of every control-plane node. A node that
//! stays not-ready longer than the kickout delay is cordoned and tainted
//! out-of-service; once it stays ready longer than the kickin delay, both
//! are undone. Nodes carrying the skip taint are never touched.

pub mod config;
pub mod controller;
pub mod error;
pub mod node;
pub mod rest_api;

pub use config::Settings;
pub use controller::Monitor;
pub use error::{Error, Result};
