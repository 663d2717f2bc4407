use mathcast_api_types::Features;

use crate::domain::{
    capabilities::Capabilities,
    types::{InputType, OutputFormat},
};

use super::types::TypesetOptions;

/// Which artifacts a request produces. Derived once and read by every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    pub input_type: InputType,
    pub output_format: OutputFormat,
    pub wants_vector: bool,
    pub wants_mathml: bool,
    pub wants_raster: bool,
    pub wants_info_report: bool,
    pub wants_aux_node: bool,
    pub wants_speech: bool,
    pub is_chemistry: bool,
}

impl RenderPlan {
    pub fn derive(
        input_type: InputType,
        output_format: OutputFormat,
        features: Features,
        capabilities: &Capabilities,
    ) -> Self {
        use OutputFormat::*;

        let mathml_bearing = matches!(output_format, MathMl | Json | Complete);
        let raster_bearing = matches!(output_format, Png | Json | Complete);

        Self {
            input_type,
            output_format,
            wants_vector: capabilities.svg && matches!(output_format, Svg | Json | Complete | Png),
            wants_mathml: input_type != InputType::MathMl && mathml_bearing,
            wants_raster: capabilities.png && raster_bearing,
            wants_info_report: capabilities.texvcinfo && output_format.is_info(),
            wants_aux_node: capabilities.img && mathml_bearing,
            wants_speech: (output_format != Png && features.speech) || output_format == Speech,
            is_chemistry: input_type == InputType::Chem,
        }
    }

    /// Dialect the engine should read the markup as.
    pub fn typeset_dialect(&self) -> InputType {
        self.input_type.typeset_dialect()
    }
}

impl TypesetOptions {
    pub fn from_plan(math: impl Into<String>, plan: &RenderPlan) -> Self {
        let mut options = Self {
            math: math.into(),
            format: plan.typeset_dialect(),
            svg: plan.wants_vector,
            aux_node: plan.wants_aux_node || plan.wants_raster,
            mml: plan.wants_mathml,
            mml_node: false,
        };

        if plan.wants_speech {
            options.mml = true;
            options.mml_node = true;
            options.aux_node = true;
        }

        options
    }
}
