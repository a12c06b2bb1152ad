//! Domain layer for TimeMachine.
//!
//! Holds the reflection domain model, the situation wizard, the simulation
//! turn controller and the seams (`ReflectionGateway`, `KeyValueStore`) that
//! the infrastructure and interaction crates implement.

pub mod config;
pub mod diary;
pub mod error;
pub mod gateway;
pub mod reflection;
pub mod session_store;
pub mod simulation;
pub mod state;
pub mod user;
pub mod wizard;

// Re-export common error type
pub use error::TimeMachineError;
