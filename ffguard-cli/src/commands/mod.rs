//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a group of subcommands.
//! [`Session`] carries what every command needs: the core configuration
//! built from the global flags and the rule tables it selects.

/// `formats`, `codecs`, `conversions` and `tables`: read-only views of the rule tables.
pub mod tables;

/// `probe`, `validate` and `check`: inspecting files and target parameters.
pub mod inspect;

/// `extract`, `split`, `transcode`, `merge`, `replace` and `compare`.
pub mod pipeline;

use ffguard_core::{
    CommandBuilder, CoreConfig, CoreConfigBuilder, Registry, SystemRunner, Toolkit,
    TranscodingParams, Validator,
};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::cli::{Cli, Commands};
use crate::error::{CliErrorContext, CliResult};

/// Configuration and rule tables for one invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: CoreConfig,
    pub registry: Registry,
}

impl Session {
    pub fn new(config: CoreConfig) -> CliResult<Self> {
        let registry = config.load_registry().cli_with_context(|| match &config.tables_path {
            Some(path) => format!("Failed to load rule tables from {}", path.display()),
            None => "Invalid built-in rule tables".to_string(),
        })?;
        Ok(Self { config, registry })
    }

    /// Builds the core configuration from the global flags.
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let mut builder = CoreConfigBuilder::new()
            .ffmpeg_program(&cli.ffmpeg)
            .ffprobe_program(&cli.ffprobe);
        if let Some(tables) = &cli.tables {
            builder = builder.tables_path(tables);
        }
        Self::new(builder.build())
    }

    pub fn toolkit(&self) -> Toolkit<'_, SystemRunner> {
        Toolkit::with_registry(self.config.system_runner(), &self.registry)
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.registry)
    }

    pub fn builder(&self) -> CommandBuilder<'_> {
        CommandBuilder::new(&self.registry)
    }
}

/// Runs the selected subcommand.
pub fn run(cli: Cli) -> CliResult<()> {
    let session = Session::from_cli(&cli)?;
    debug!("Running {:?}", cli.command);

    match cli.command {
        Commands::Formats => tables::run_formats(&session),
        Commands::Codecs(args) => tables::run_codecs(&session, &args),
        Commands::Conversions(args) => tables::run_conversions(&session, &args),
        Commands::Tables => tables::run_tables(&session),
        Commands::Probe(args) => inspect::run_probe(&session, &args),
        Commands::Validate(args) => inspect::run_validate(&session, &args),
        Commands::Check(args) => inspect::run_check(&session, &args),
        Commands::Extract(args) => pipeline::run_extract(&session, &args),
        Commands::Split(args) => pipeline::run_split(&session, &args),
        Commands::Transcode(args) => pipeline::run_transcode(&session, &args),
        Commands::Merge(args) => pipeline::run_merge(&session, &args),
        Commands::Replace(args) => pipeline::run_replace(&session, &args),
        Commands::Compare(args) => pipeline::run_compare(&session, &args),
    }
}

/// Reads a JSON file.
pub fn read_json_file(path: &Path) -> CliResult<Value> {
    let text = fs::read_to_string(path)
        .cli_with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).cli_with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Reads target parameters given inline (a JSON object) or as a file path.
pub fn load_params_json(value: &str) -> CliResult<Value> {
    if value.trim_start().starts_with('{') {
        return serde_json::from_str(value).cli_context("Invalid transcoding parameters");
    }
    read_json_file(Path::new(value))
}

/// Parses target parameters given inline (a JSON object) or as a file path.
pub fn load_params(value: &str) -> CliResult<TranscodingParams> {
    TranscodingParams::from_value(&load_params_json(value)?)
}

/// Metadata from a JSON file when given, otherwise from probing `file`.
pub fn load_metadata(session: &Session, file: Option<&Path>, metadata: Option<&Path>) -> CliResult<Value> {
    match (metadata, file) {
        (Some(json), _) => read_json_file(json),
        (None, Some(file)) => session
            .toolkit()
            .probe(file)
            .cli_with_context(|| format!("Failed to probe {}", file.display())),
        (None, None) => Err(crate::cli_error!("Either a file or --metadata is required")),
    }
}
