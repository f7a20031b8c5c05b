mod assets;

pub mod client;
pub mod config;
pub mod driver;
pub mod ledger;
pub mod report;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::assets::{LogPaths, config_file_path, log_paths};
pub use crate::driver::{ApiResponse, Driver, RunSummary};
