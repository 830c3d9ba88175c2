//! CLI arguments and the derived export configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// How the rig file on disk is to be interpreted.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RigFormat {
    /// A bare dump of 0x80-byte bone records.
    #[default]
    Raw,
    /// An existing model file; the bone table is extracted from it.
    Gno,
}

#[derive(Parser, Debug)]
#[command(
    name = "gno-export",
    version,
    about = "Export a normalized scene document into a GNO model container"
)]
pub struct CliArgs {
    /// Scene JSON document.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output .gno path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Rig file providing the bone records.
    #[arg(long)]
    pub rig: PathBuf,

    /// Interpretation of the rig file.
    #[arg(long, value_enum, default_value_t = RigFormat::Raw)]
    pub rig_format: RigFormat,

    /// Leave out the texture list chunk.
    #[arg(long)]
    pub no_texture_list: bool,

    /// Tolerate non-manifold topology instead of aborting.
    #[arg(long)]
    pub lenient_topology: bool,

    /// Load and validate the scene, print statistics, write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved configuration the pipeline runs on.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rig: PathBuf,
    pub rig_format: RigFormat,
    pub include_texture_list: bool,
    pub strict_topology: bool,
    pub dry_run: bool,
}

impl From<&CliArgs> for ExportConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            input: args.input.clone(),
            output: args.output.clone(),
            rig: args.rig.clone(),
            rig_format: args.rig_format,
            include_texture_list: !args.no_texture_list,
            strict_topology: !args.lenient_topology,
            dry_run: args.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from([
            "gno-export",
            "-i",
            "scene.json",
            "-o",
            "model.gno",
            "--rig",
            "rig.bin",
        ])
        .unwrap();
        let config = ExportConfig::from(&args);

        assert_eq!(config.rig_format, RigFormat::Raw);
        assert!(config.include_texture_list);
        assert!(config.strict_topology);
        assert!(!config.dry_run);
    }

    #[test]
    fn flags_invert_into_config() {
        let args = CliArgs::try_parse_from([
            "gno-export",
            "-i",
            "scene.json",
            "-o",
            "model.gno",
            "--rig",
            "model_old.gno",
            "--rig-format",
            "gno",
            "--no-texture-list",
            "--lenient-topology",
        ])
        .unwrap();
        let config = ExportConfig::from(&args);

        assert_eq!(config.rig_format, RigFormat::Gno);
        assert!(!config.include_texture_list);
        assert!(!config.strict_topology);
    }

    #[test]
    fn missing_required_args_rejected() {
        assert!(CliArgs::try_parse_from(["gno-export", "-i", "scene.json"]).is_err());
    }
}
