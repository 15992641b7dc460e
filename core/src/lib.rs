//! Peer distribution and anchor summary engine for institution-level
//! higher-education metrics.
//!
//! The engine (`engine`, `frame`, `peer`, `anchor`, `stats`) is pure and
//! stateless. Loading (`loader`, `cache`, `store`), derived outputs
//! (`outputs`) and mock data (`mock`) are collaborators around it.

pub mod anchor;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod loader;
pub mod mock;
pub mod outputs;
pub mod peer;
pub mod rng;
pub mod stats;
pub mod store;
pub mod table;
pub mod threshold;
pub mod types;
