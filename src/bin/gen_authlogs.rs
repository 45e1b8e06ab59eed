//! Synthetic auth log generator
//! Writes Apache access or sshd authentication lines for exercising the
//! analyzer end to end without a real capture

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use authlog_charts::dialect::Dialect;
use authlog_charts::generator;

#[derive(Parser, Debug)]
#[command(name = "gen_authlogs", about = "Synthetic Apache/sshd log generator")]
struct Args {
    /// Number of lines to generate
    #[arg(long, default_value = "1000", help = "Total number of log lines")]
    count: u64,

    /// Log dialect to emit
    #[arg(long, default_value = "ssh", help = "Log dialect: apache or ssh")]
    dialect: String,

    /// Output file path
    #[arg(long, default_value = "synthetic.log", help = "File the lines are written to")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dialect = match args.dialect.as_str() {
        "apache" => Dialect::Apache,
        "ssh" => Dialect::Ssh,
        other => anyhow::bail!("Unknown dialect: {} (expected apache or ssh)", other),
    };

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);

    for i in 0..args.count {
        writeln!(writer, "{}", generator::generate_line(dialect))?;
        if i > 0 && i % 10_000 == 0 {
            info!("Wrote {} lines", i);
        }
    }
    writer.flush()?;

    info!(
        "Wrote {} {} lines to {}",
        args.count,
        args.dialect,
        args.output.display()
    );
    Ok(())
}
