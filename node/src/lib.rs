//! Proof registration node: the coordinating layer over the proof pools and the
//! peer slot allocator.
//!
//! The node:
//! - Validates incoming proofs structurally
//! - Keeps valid and conflicting proofs in separate pools
//! - Gives every valid proof a peer weighted by its stake
//! - Selects peers proportionally to stake
//! - Exposes its state as Prometheus metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, try_init_logging, LogFormat};
pub use metrics::AvalancheMetrics;
pub use processor::{Processor, Registration};
