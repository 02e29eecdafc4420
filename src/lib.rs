//! Task automation for the formulae documentation site.
//!
//! The library dumps package metadata and usage analytics through the package
//! manager, builds the static site from them and validates the output. Every
//! heavy operation is delegated to an external program; this crate owns the
//! orchestration around them: the task graph, bounded retries of flaky
//! analytics queries, the analytics file matrix and cleanup of generated
//! artifacts.

mod analytics;
mod cleanup;
mod command;
mod config;
mod credentials;
mod error;
mod lint;
mod retry;
mod tasks;

pub use analytics::{
    ANALYTICS_LAYOUT, AnalyticsCell, AnalyticsGenerator, Category, DAY_WINDOWS, GenerationReport, Os, Query,
    cells, front_matter,
};
pub use cleanup::{CleanupEntry, CleanupRegistry, CleanupScope};
pub use command::{CommandRunner, ExternalCommand, ProcessRunner};
pub use config::{DEFAULT_CONFIG_FILE, SITE_DIR_PLACEHOLDER, Settings};
pub use credentials::{CredentialsOutcome, home_directory, install_credentials, prepare_analytics, setup_commands};
pub use error::{Error, io_error};
pub use lint::{LintFailure, LintReport, check_json, json_files, lint_json};
pub use retry::{RetryBudget, RetryPolicy, RetryingExecutor, Sleeper, TokioSleeper};
pub use tasks::{DEFAULT_TASK, Invocation, TASKS, TaskExecutor, TaskGraph, TaskName, TaskSpec, TaskState};
