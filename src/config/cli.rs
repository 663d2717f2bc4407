use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::application::batch::DEFAULT_CONCURRENCY;

/// Command-line arguments for the mathcast binary.
#[derive(Debug, Parser)]
#[command(
    name = "mathcast",
    version,
    about = "Render TeX, MathML, AsciiMath and chemistry markup to SVG, PNG, MathML and speech"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MATHCAST_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP render service.
    Serve(Box<ServeArgs>),
    /// Render a JSON array of queries from a file or stdin.
    Batch(BatchArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub common: CommonOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// JSON array of `{"query": {...}}` entries; stdin when omitted.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Where to write the keyed results; stdout when omitted.
    #[arg(value_name = "OUTPUT", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Maximum number of entries rendered concurrently (clamped to 1..=32).
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = clap::value_parser!(usize))]
    pub concurrency: usize,
}

/// Overrides shared by every command.
#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Skip the TeX checker for regular output formats.
    #[arg(
        long = "no-check",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub no_check: Option<bool>,

    /// Toggle SVG optimization.
    #[arg(
        long = "svgo",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub svgo: Option<bool>,

    /// Override the raster resolution.
    #[arg(long = "dpi", value_name = "DPI")]
    pub dpi: Option<f64>,

    /// Typesetting backend (katex|command).
    #[arg(long = "typesetter", value_name = "BACKEND")]
    pub typesetter: Option<String>,

    /// TeX checker backend (katex|command).
    #[arg(long = "checker", value_name = "BACKEND")]
    pub checker: Option<String>,

    /// Executable implementing the typesetter protocol.
    #[arg(long = "typesetter-command", value_name = "PATH")]
    pub typesetter_command: Option<PathBuf>,

    /// Executable implementing the checker protocol.
    #[arg(long = "checker-command", value_name = "PATH")]
    pub checker_command: Option<PathBuf>,

    /// Executable implementing the speech protocol.
    #[arg(long = "speech-command", value_name = "PATH")]
    pub speech_command: Option<PathBuf>,

    /// Executable used to optimize SVG output.
    #[arg(long = "svgo-command", value_name = "PATH")]
    pub svgo_command: Option<PathBuf>,
}
