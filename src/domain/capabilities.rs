//! Enabled-feature flags and tuning constants shared read-only by every request.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DPI: f64 = 100.0;
pub const DEFAULT_SPEECH_DOMAIN: &str = "mathspeak";
pub const DEFAULT_SPEECH_STYLE: &str = "default";
pub const DEFAULT_SPEECH_LOCALE: &str = "en";

/// Capability flag that gates an output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Svg,
    Png,
    Speech,
    TexvcInfo,
}

impl Capability {
    /// Configuration key that enables the capability.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Svg => "svg",
            Capability::Png => "png",
            Capability::Speech => "speech",
            Capability::TexvcInfo => "texvcinfo",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable capability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub svg: bool,
    pub png: bool,
    /// Produce the auxiliary node for MathML-bearing formats.
    pub img: bool,
    pub speech: bool,
    pub texvcinfo: bool,
    /// Skip the TeX checker for regular formats.
    pub no_check: bool,
    /// Run the SVG optimizer on vector output.
    pub svgo: bool,
    /// Speech default for requests that do not say otherwise.
    pub speech_on: bool,
    /// Target raster resolution.
    pub dpi: f64,
    pub speech_config: SpeechConfig,
}

impl Capabilities {
    pub fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::Svg => self.svg,
            Capability::Png => self.png,
            Capability::Speech => self.speech,
            Capability::TexvcInfo => self.texvcinfo,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            svg: true,
            png: true,
            img: false,
            speech: true,
            texvcinfo: true,
            no_check: false,
            svgo: false,
            speech_on: true,
            dpi: DEFAULT_DPI,
            speech_config: SpeechConfig::default(),
        }
    }
}

/// Speech engine settings, passed explicitly with every speech call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Attach the semantic tree to the result.
    pub semantic: bool,
    /// Keep the semantic XML compact instead of pretty-printing it.
    pub min_stree: bool,
    pub speak_text: bool,
    /// Replace MathML with its semantically enriched form.
    pub enrich: bool,
    pub domain: String,
    pub style: String,
    pub locale: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            semantic: false,
            min_stree: false,
            speak_text: true,
            enrich: false,
            domain: DEFAULT_SPEECH_DOMAIN.to_string(),
            style: DEFAULT_SPEECH_STYLE.to_string(),
            locale: DEFAULT_SPEECH_LOCALE.to_string(),
        }
    }
}
