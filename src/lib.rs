//! Student records engine: a SQLite-backed roster with grading, statistics,
//! search routing and CSV/report export, plus the terminal front-end that
//! drives it.
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod grade;
pub mod logging;
pub mod models;
pub mod search;
pub mod stats;
pub mod ui;
pub mod validation;

pub use config::{AppConfig, DatabaseTarget, StoreConfig};
pub use db::Session;
pub use error::{ErrorKind, RecordError, RecordResult};
pub use export::ExportFormat;
pub use grade::Grade;
pub use models::{Role, Student, StudentDetails, UserAccount};
pub use search::{run_search, SearchMode};
pub use stats::StatisticsSnapshot;
pub use validation::StudentInput;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
