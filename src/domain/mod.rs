//! Domain layer: pure types and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod application;
pub mod config;
pub mod error;
pub mod instances;
pub mod logs;

pub use application::{AppState, Application, PackageState};
pub use config::{CfConfig, StartTimeouts, TargetConfig, TimeoutConfig};
pub use error::{ConfigError, StartError};
pub use instances::{InstanceRecord, InstanceSnapshot, InstanceState};
pub use logs::{ConnectionStatus, LogMessage};
