use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gno_export::{CliArgs, ExportConfig, Exporter};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let default_filter = if args.verbose {
        "gno_export=debug"
    } else {
        "gno_export=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = ExportConfig::from(&args);
    let summary = Exporter::new(config).run().context("export failed")?;

    if summary.file_size > 0 {
        println!(
            "wrote {} ({} bytes, {} meshes, {} strips)",
            summary.output.display(),
            summary.file_size,
            summary.mesh_count,
            summary.strip_count
        );
    }
    Ok(())
}
