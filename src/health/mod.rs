//! Health reporting: probe loop, report records and the status endpoint.
//!
//! Split into three pieces with a single-writer rule throughout:
//! - [`reporter`] probes the service and is the only writer of
//!   [`HealthReport`] snapshots;
//! - [`report`] defines the record and the reader-side staleness rule;
//! - [`server`] answers orchestrator queries from the latest snapshots.

pub mod report;
pub mod reporter;
pub mod server;

pub use report::{HealthReport, Verdict};
pub use reporter::HealthReporter;
pub use server::start_status_server;
