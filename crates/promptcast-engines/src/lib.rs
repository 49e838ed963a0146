//! # Promptcast Engine Catalog
//!
//! Static descriptors for the supported third-party chat engines and the
//! selector cascades used to find their composer inputs and submit controls.
//! Descriptors are built once at startup and shared read-only across all
//! injection attempts for an engine.

pub mod descriptor;
pub mod registry;
pub mod strategy;

pub use descriptor::EngineDescriptor;
pub use registry::{EngineError, EngineRegistry};
pub use strategy::DomTargetStrategy;
