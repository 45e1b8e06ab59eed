//! End-to-end analysis pipeline
//!
//! Runs one log through the whole chain: admin filtering, dialect
//! detection on the first surviving line, per-line classification,
//! frequency aggregation with country resolution, and finally chart
//! rendering. Everything downstream of the filter reads the filtered
//! working copy, never the original file.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::aggregator::FrequencyAggregator;
use crate::chart::ChartRenderer;
use crate::classifier::LineClassifier;
use crate::config::AnalyzerConfig;
use crate::dialect::Dialect;
use crate::errors::Result;
use crate::filter::{AdminFilter, FilterStats};
use crate::geo::GeoResolver;

/// Everything one run produced, for summaries and tests.
pub struct RunReport {
    pub dialect: Dialect,
    pub filter: FilterStats,
    pub relevant_lines: usize,
    pub aggregates: FrequencyAggregator,
    pub charts: Vec<PathBuf>,
}

pub async fn run(config: &AnalyzerConfig, resolver: Arc<dyn GeoResolver>) -> Result<RunReport> {
    std::fs::create_dir_all(&config.out_dir)?;

    let filtered_path = config.filtered_log_path();
    let filter_stats = AdminFilter::new(config.admin_ips.clone())
        .write_filtered(&config.log_file, &filtered_path)?;
    info!(
        "Filtered copy at {}: kept {} of {} lines",
        filtered_path.display(),
        filter_stats.lines_kept,
        filter_stats.lines_read
    );

    let contents = std::fs::read_to_string(&filtered_path)?;
    let dialect = contents
        .lines()
        .next()
        .map(Dialect::detect)
        .unwrap_or(Dialect::Unknown);
    match dialect {
        Dialect::Unknown => warn!("First line matched no known log signature; nothing will be counted"),
        _ => info!("Detected {} log dialect", dialect),
    }

    let classifier = LineClassifier::new(dialect);
    let mut aggregates = FrequencyAggregator::new(resolver);
    let mut relevant_lines = 0usize;

    for line in contents.lines() {
        let event = classifier.classify(line);
        if event.source_ip.is_some() {
            relevant_lines += 1;
        }
        aggregates.apply(&event).await;
    }
    aggregates.finalize_countries();

    let mut charts = Vec::new();
    if config.dry_run {
        info!("Dry run: skipping chart rendering");
    } else {
        let renderer = ChartRenderer::new(&config.out_dir);
        match dialect {
            Dialect::Ssh => {
                charts.push(renderer.render(aggregates.ip_count(), "Top 10 IPs", "sship")?);
                charts.push(renderer.render(
                    aggregates.country_count(),
                    "Top 10 Countries",
                    "sshcountry",
                )?);
                charts.push(renderer.render_split(
                    aggregates.user_count(),
                    aggregates.user_success(),
                    aggregates.user_failed(),
                    "Top 10 Users",
                    "sshusers",
                )?);
            }
            Dialect::Apache => {
                charts.push(renderer.render(aggregates.ip_count(), "Top 10 IPs", "apacheip")?);
                charts.push(renderer.render(
                    aggregates.country_count(),
                    "Top 10 Countries",
                    "apachecountry",
                )?);
            }
            Dialect::Unknown => {}
        }
    }

    info!(
        "Analysis complete: {} lines read, {} dropped by admin filter, {} relevant, {} distinct IPs, {} users, {} countries, {} lockout attempts, {} charts",
        filter_stats.lines_read,
        filter_stats.lines_dropped,
        relevant_lines,
        aggregates.distinct_ips(),
        aggregates.distinct_users(),
        aggregates.distinct_countries(),
        aggregates.lockout_total(),
        charts.len()
    );

    Ok(RunReport {
        dialect,
        filter: filter_stats,
        relevant_lines,
        aggregates,
        charts,
    })
}
