mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use pr2md_core::{init_logging, Config};
use pr2md_report::{write_report, Git, GitCli, ReportGenerator, ReportOptions};
use std::path::PathBuf;
use tracing::{debug, info};

fn main() {
    let cli = Cli::parse();
    let guard = init_logging(&cli.log_level);

    let result = run(cli);

    // flush buffered log lines before a possible exit
    drop(guard);
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.repo, cli.config.as_deref())
        .context("Failed to load configuration")?;
    let settings = cli.apply(config.report);
    debug!(?settings, "Effective settings");

    let options = ReportOptions::from_config(&settings, cli.ref_request());
    let generator = ReportGenerator::new(options)?;

    info!(repo = %cli.repo.display(), "Generating report");
    let report = generator.generate(&Git::new(GitCli::new(&cli.repo)))?;

    let output = PathBuf::from(settings.output());
    write_report(&output, &report.markdown)?;

    println!("{}", output.display());
    Ok(())
}
