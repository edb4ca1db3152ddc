use anyhow::Result;
use chanbook::cli::Cli;
use chanbook::config::RunConfig;
use chanbook::epub_writer::EpubWriter;
use chanbook::export_source::ExportSource;
use chanbook::pipeline::{self, RunOutcome};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "chanbook=debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = RunConfig::from_cli(&cli)?;
    let source = ExportSource::new(&config.exports_dir);
    let mut book = EpubWriter::new();

    match pipeline::run(&config, &source, &mut book)? {
        RunOutcome::Written { path, report } => {
            tracing::info!(
                "Wrote {} posts{} to {}",
                report.posts,
                if report.images > 0 {
                    format!(" and {} images", report.images)
                } else {
                    String::new()
                },
                path.display()
            );
            for (filename, reason) in &report.skipped {
                tracing::warn!("Left out {}: {}", filename, reason);
            }
        }
        RunOutcome::Empty => tracing::info!("Nothing to write"),
    }

    Ok(())
}
