//! Live-runtime pipeline of the ValveSim test-rig simulator.
//!
//! Builds an in-memory address space from a mapping file (one live node
//! per entry with a wire address) and drives a continuous, per-node
//! type-directed value-generation loop that emulates the real rig's
//! telemetry and configuration points.
//!
//! - **[`address`]**: wire-address grammar (`ns=…;i=…` / `ns=…;s=…`)
//! - **[`space`]**: the node tree and its values
//! - **[`scheduler`]**: periodic update policy per data kind
//! - **[`config`]**: simulator settings

pub mod address;
pub mod config;
pub mod scheduler;
pub mod space;

// Re-exports for convenience
pub use address::{AddressError, Identifier, NodeAddress};
pub use config::{ConfigError, SimConfig};
pub use scheduler::{
    advance_value, run_tick, SchedulerError, SchedulerState, UpdateScheduler,
    BOOL_FLIP_PROBABILITY, DEFAULT_TICK_INTERVAL,
};
pub use space::{AddressSpace, LiveNode, NodeSnapshot, SpaceError, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
