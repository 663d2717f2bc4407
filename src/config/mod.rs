//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::capabilities::{
    Capabilities, DEFAULT_DPI, DEFAULT_SPEECH_DOMAIN, DEFAULT_SPEECH_LOCALE, DEFAULT_SPEECH_STYLE,
    SpeechConfig,
};

mod cli;

pub use cli::{BatchArgs, CliArgs, Command, CommonOverrides, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mathcast";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 10044;
const BACKEND_KATEX: &str = "katex";
const BACKEND_COMMAND: &str = "command";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub capabilities: Capabilities,
    pub engines: EngineSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Which implementation backs each collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub typesetter: EngineBackend,
    pub checker: EngineBackend,
    pub speech: Option<CommandSettings>,
    pub svgo: Option<CommandSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineBackend {
    Katex,
    Command(CommandSettings),
}

/// External executable plus the arguments placed before any subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettings {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("MATHCAST").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Batch(args)) => raw.apply_common_overrides(&args.overrides),
        None => {}
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    capabilities: RawCapabilitySettings,
    speech: RawSpeechSettings,
    engines: RawEngineSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }

        self.apply_common_overrides(&overrides.common);
    }

    fn apply_common_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(no_check) = overrides.no_check {
            self.capabilities.no_check = Some(no_check);
        }
        if let Some(svgo) = overrides.svgo {
            self.capabilities.svgo = Some(svgo);
        }
        if let Some(dpi) = overrides.dpi {
            self.capabilities.dpi = Some(dpi);
        }
        if let Some(backend) = overrides.typesetter.as_ref() {
            self.engines.typesetter = Some(backend.clone());
        }
        if let Some(backend) = overrides.checker.as_ref() {
            self.engines.checker = Some(backend.clone());
        }
        if let Some(program) = overrides.typesetter_command.as_ref() {
            self.engines.typesetter_command.program = Some(program.clone());
        }
        if let Some(program) = overrides.checker_command.as_ref() {
            self.engines.checker_command.program = Some(program.clone());
        }
        if let Some(program) = overrides.speech_command.as_ref() {
            self.engines.speech_command.program = Some(program.clone());
        }
        if let Some(program) = overrides.svgo_command.as_ref() {
            self.engines.svgo_command.program = Some(program.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            capabilities,
            speech,
            engines,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let speech_config = build_speech_config(speech)?;
        let engines = build_engine_settings(engines)?;
        let capabilities =
            build_capabilities(capabilities, speech_config, engines.speech.is_some())?;

        Ok(Self {
            server,
            logging,
            capabilities,
            engines,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let candidate = format!("{host}:{port}");
    let addr = candidate.parse().map_err(|err| {
        LoadError::invalid("server.addr", format!("invalid address `{candidate}`: {err}"))
    })?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_speech_config(speech: RawSpeechSettings) -> Result<SpeechConfig, LoadError> {
    let defaults = SpeechConfig::default();

    let domain = non_empty(speech.domain, DEFAULT_SPEECH_DOMAIN, "speech.domain")?;
    let style = non_empty(speech.style, DEFAULT_SPEECH_STYLE, "speech.style")?;
    let locale = non_empty(speech.locale, DEFAULT_SPEECH_LOCALE, "speech.locale")?;

    Ok(SpeechConfig {
        semantic: speech.semantic.unwrap_or(defaults.semantic),
        min_stree: speech.min_stree.unwrap_or(defaults.min_stree),
        speak_text: speech.speak_text.unwrap_or(defaults.speak_text),
        enrich: speech.enrich.unwrap_or(defaults.enrich),
        domain,
        style,
        locale,
    })
}

/// Speech flags follow the speech engine: they default to whether one is
/// configured, and enabling them without one is rejected.
fn build_capabilities(
    raw: RawCapabilitySettings,
    speech_config: SpeechConfig,
    has_speech_engine: bool,
) -> Result<Capabilities, LoadError> {
    let defaults = Capabilities::default();

    let dpi = raw.dpi.unwrap_or(DEFAULT_DPI);
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(LoadError::invalid(
            "capabilities.dpi",
            "must be a positive number",
        ));
    }

    let speech = speech_flag(raw.speech, has_speech_engine, "capabilities.speech")?;
    let speech_on = speech_flag(raw.speech_on, has_speech_engine, "capabilities.speech_on")?;

    Ok(Capabilities {
        svg: raw.svg.unwrap_or(defaults.svg),
        png: raw.png.unwrap_or(defaults.png),
        img: raw.img.unwrap_or(defaults.img),
        speech,
        texvcinfo: raw.texvcinfo.unwrap_or(defaults.texvcinfo),
        no_check: raw.no_check.unwrap_or(defaults.no_check),
        svgo: raw.svgo.unwrap_or(defaults.svgo),
        speech_on,
        dpi,
        speech_config,
    })
}

fn speech_flag(
    value: Option<bool>,
    has_speech_engine: bool,
    key: &'static str,
) -> Result<bool, LoadError> {
    match value {
        Some(true) if !has_speech_engine => Err(LoadError::invalid(
            key,
            "requires engines.speech_command.program",
        )),
        Some(enabled) => Ok(enabled),
        None => Ok(has_speech_engine),
    }
}

fn build_engine_settings(engines: RawEngineSettings) -> Result<EngineSettings, LoadError> {
    let typesetter = build_backend(
        engines.typesetter,
        engines.typesetter_command,
        "engines.typesetter",
        "engines.typesetter_command.program",
    )?;
    let checker = build_backend(
        engines.checker,
        engines.checker_command,
        "engines.checker",
        "engines.checker_command.program",
    )?;
    let speech = build_command(engines.speech_command, "engines.speech_command.program")?;
    let svgo = build_command(engines.svgo_command, "engines.svgo_command.program")?;

    Ok(EngineSettings {
        typesetter,
        checker,
        speech,
        svgo,
    })
}

fn build_backend(
    backend: Option<String>,
    command: RawCommandSettings,
    key: &'static str,
    program_key: &'static str,
) -> Result<EngineBackend, LoadError> {
    let backend = backend.unwrap_or_else(|| BACKEND_KATEX.to_string());
    match backend.trim().to_ascii_lowercase().as_str() {
        BACKEND_KATEX => Ok(EngineBackend::Katex),
        BACKEND_COMMAND => build_command(command, program_key)?
            .map(EngineBackend::Command)
            .ok_or_else(|| {
                LoadError::invalid(program_key, "required when the command backend is selected")
            }),
        other => Err(LoadError::invalid(
            key,
            format!("unknown backend `{other}`, expected `katex` or `command`"),
        )),
    }
}

fn build_command(
    command: RawCommandSettings,
    key: &'static str,
) -> Result<Option<CommandSettings>, LoadError> {
    let Some(program) = command.program else {
        return Ok(None);
    };
    if program.as_os_str().is_empty() {
        return Err(LoadError::invalid(key, "path must not be empty"));
    }
    Ok(Some(CommandSettings {
        program,
        args: command.args.unwrap_or_default(),
    }))
}

fn non_empty(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(LoadError::invalid(key, "must not be empty")),
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(default.to_string()),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCapabilitySettings {
    svg: Option<bool>,
    png: Option<bool>,
    img: Option<bool>,
    speech: Option<bool>,
    texvcinfo: Option<bool>,
    no_check: Option<bool>,
    svgo: Option<bool>,
    speech_on: Option<bool>,
    dpi: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSpeechSettings {
    semantic: Option<bool>,
    min_stree: Option<bool>,
    speak_text: Option<bool>,
    enrich: Option<bool>,
    domain: Option<String>,
    style: Option<String>,
    locale: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEngineSettings {
    typesetter: Option<String>,
    checker: Option<String>,
    typesetter_command: RawCommandSettings,
    checker_command: RawCommandSettings,
    speech_command: RawCommandSettings,
    svgo_command: RawCommandSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCommandSettings {
    program: Option<PathBuf>,
    args: Option<Vec<String>>,
}

#[cfg(test)]
mod tests;
