//! Canonical input types and output formats understood by the render pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Markup dialect of a render request after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputType {
    #[serde(rename = "TeX")]
    Tex,
    #[serde(rename = "inline-TeX")]
    InlineTex,
    #[serde(rename = "MathML")]
    MathMl,
    #[serde(rename = "AsciiMath")]
    AsciiMath,
    /// Chemistry shorthand; typeset as inline TeX once checked.
    #[serde(rename = "chem")]
    Chem,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Tex => "TeX",
            InputType::InlineTex => "inline-TeX",
            InputType::MathMl => "MathML",
            InputType::AsciiMath => "AsciiMath",
            InputType::Chem => "chem",
        }
    }

    /// TeX or inline TeX.
    pub fn is_tex_family(self) -> bool {
        matches!(self, InputType::Tex | InputType::InlineTex)
    }

    /// Dialect handed to the typesetting engine.
    pub fn typeset_dialect(self) -> InputType {
        match self {
            InputType::Chem => InputType::InlineTex,
            other => other,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the response a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Png,
    #[serde(rename = "mml")]
    MathMl,
    Speech,
    Json,
    Complete,
    /// Checker feedback report.
    #[serde(rename = "texvcinfo")]
    InfoReport,
    /// Checker parse tree.
    Graph,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::MathMl => "mml",
            OutputFormat::Speech => "speech",
            OutputFormat::Json => "json",
            OutputFormat::Complete => "complete",
            OutputFormat::InfoReport => "texvcinfo",
            OutputFormat::Graph => "graph",
        }
    }

    /// Formats answered straight from the checker without typesetting.
    pub fn is_info(self) -> bool {
        matches!(self, OutputFormat::InfoReport | OutputFormat::Graph)
    }

    /// Formats that respond with a single artifact body rather than JSON.
    pub fn is_single_artifact(self) -> bool {
        matches!(
            self,
            OutputFormat::Svg | OutputFormat::Png | OutputFormat::MathMl | OutputFormat::Speech
        )
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
