use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use authlog_charts::config::AnalyzerConfig;
use authlog_charts::geo::{GeoResolver, IpApiResolver, OfflineResolver};
use authlog_charts::pipeline;
use authlog_charts::{NAME, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AnalyzerConfig::parse();

    // Initialize logging
    let log_level = if config.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(log_level));

    info!("Starting {} v{}", NAME, VERSION);
    config.validate().context("Invalid configuration")?;

    let resolver: Arc<dyn GeoResolver> = if config.offline {
        warn!("Offline mode: every IP will be counted as Unknown");
        Arc::new(OfflineResolver)
    } else {
        Arc::new(
            IpApiResolver::new(&config.geo_endpoint, Duration::from_secs(config.geo_timeout))
                .context("Failed to create geo resolver")?,
        )
    };

    let report = pipeline::run(&config, resolver)
        .await
        .with_context(|| format!("Failed to analyze {}", config.log_file.display()))?;

    info!(
        "Done: {} dialect, {} relevant lines, {} charts written",
        report.dialect,
        report.relevant_lines,
        report.charts.len()
    );
    Ok(())
}
