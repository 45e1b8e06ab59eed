//! Configuration module for the log analyzer
//! Handles CLI argument parsing and validation

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

use crate::filter::FILTERED_LOG_NAME;
use crate::geo::DEFAULT_GEO_ENDPOINT;

#[derive(Parser, Clone, Debug)]
#[command(name = "authlog_charts", about = "Auth log classifier with top-offender charts")]
#[command(version = "1.0")]
pub struct AnalyzerConfig {
    /// Log file to analyze
    #[arg(help = "Apache access log or sshd authentication log")]
    pub log_file: PathBuf,

    /// Administrative source addresses
    #[arg(long = "admin-ip", value_name = "IP", help = "Drop lines mentioning this address (repeatable)")]
    pub admin_ips: Vec<String>,

    /// Output directory
    #[arg(long, default_value = ".", help = "Directory for the filtered copy and chart PNGs")]
    pub out_dir: PathBuf,

    /// Geolocation endpoint URL
    #[arg(long, default_value = DEFAULT_GEO_ENDPOINT, help = "Country lookup endpoint; the IP is appended to the URL")]
    pub geo_endpoint: String,

    /// Geolocation timeout in seconds
    #[arg(long, default_value = "5", help = "Country lookup timeout (seconds)")]
    pub geo_timeout: u64,

    /// Offline mode (no lookups)
    #[arg(long, help = "Skip country lookups; every IP counts as Unknown")]
    pub offline: bool,

    /// Dry run mode (no chart files)
    #[arg(long, help = "Filter and aggregate without rendering charts")]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl AnalyzerConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.geo_timeout == 0 {
            anyhow::bail!("Geo timeout must be greater than 0");
        }

        if !self.geo_endpoint.starts_with("http://") && !self.geo_endpoint.starts_with("https://") {
            anyhow::bail!("Geo endpoint must be a valid HTTP/HTTPS URL");
        }

        if self.admin_ips.iter().any(|ip| ip.trim().is_empty()) {
            anyhow::bail!("Admin IP entries must not be empty");
        }

        Ok(())
    }

    /// Where the filtered working copy is written
    pub fn filtered_log_path(&self) -> PathBuf {
        self.out_dir.join(FILTERED_LOG_NAME)
    }
}

impl fmt::Display for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalyzerConfig {{ log_file: {}, admin_ips: {}, out_dir: {}, offline: {}, dry_run: {} }}",
            self.log_file.display(),
            self.admin_ips.len(),
            self.out_dir.display(),
            self.offline,
            self.dry_run
        )
    }
}
