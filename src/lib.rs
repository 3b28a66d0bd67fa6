//! warden - supervised process lifecycle manager
//!
//! Provisions a declared dependency set, composes the service environment
//! from static config plus host-provided secrets, launches the service under
//! an always-restart supervisor, and reports liveness to orchestrators.

pub mod compose;
pub mod config;
pub mod error;
pub mod health;
pub mod installer;
pub mod service;
pub mod supervisor;
pub mod unit;
pub mod utils;

pub use compose::{compose, EnvSnapshot, EnvValue};
pub use config::Config;
pub use error::{Result, WardenError};
pub use health::{HealthReport, HealthReporter, Verdict};
pub use service::ServiceSpec;
pub use supervisor::{RestartPolicy, ServiceState, StopHandle, Supervisor, SupervisorStatus};
