//! Auth Log Charts Library
//! Log classification, frequency aggregation, and top-offender donut
//! charts for Apache access logs and sshd authentication logs

pub mod aggregator;
pub mod chart;
pub mod classifier;
pub mod config;
pub mod dialect;
pub mod errors;
pub mod filter;
pub mod generator;
pub mod geo;
pub mod pipeline;

// Re-export commonly used types
pub use aggregator::{FrequencyAggregator, FrequencyTable};
pub use chart::ChartRenderer;
pub use classifier::{AuthOutcome, LineClassifier, LineEvent};
pub use config::AnalyzerConfig;
pub use dialect::Dialect;
pub use errors::{AnalyzerError, Result};
pub use filter::AdminFilter;
pub use geo::{GeoResolver, IpApiResolver, OfflineResolver};
pub use pipeline::RunReport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
