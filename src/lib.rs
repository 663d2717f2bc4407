//! Math rendering service: TeX, MathML, AsciiMath and chemistry markup in;
//! SVG, PNG, MathML, speech and checker reports out.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
