// Core business logic lives here - the brain of the operation
pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod packages;
pub mod providers;
pub mod source;
pub mod stats;
pub mod stats_with_cache;
pub mod validate;

pub use aggregate::Aggregator;
pub use batch::{BatchOutcome, BatchRunner, BatchSummary};
pub use config::Config;
pub use error::Error;
pub use export::{truncate_description, truncate_report_descriptions, Exporter, ReportFormat};
pub use models::{AggregateReport, PackageInfo, PackageType, ReleaseInfo, Repository, Summary};
pub use providers::GitHubProvider;
pub use source::ReleaseSource;
pub use stats_with_cache::{CachedStatsService, StatsResponse};
pub use validate::{is_valid_username, validate_username};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
