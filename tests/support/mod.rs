#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use mathcast::{
    application::render::{
        CheckerFeedback, Collaborators, EngineError, MathRenderService, PixelSize, Rasterizer,
        SemanticTree, SpeechEngine, SvgOptimizer, TexChecker, TypesetEngine, TypesetOptions,
        TypesetOutput,
    },
    domain::{capabilities::Capabilities, capabilities::SpeechConfig, types::InputType},
};
use serde_json::{Value, json};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
pub const SPOKEN: &str = "x squared";
pub const OPTIMIZED_SVG: &str = "<svg optimized=\"true\"/>";

/// Call counts shared by every mock collaborator.
#[derive(Debug, Default)]
pub struct Calls {
    pub typeset: AtomicUsize,
    pub feedback: AtomicUsize,
    pub parse_tree: AtomicUsize,
    pub rasterize: AtomicUsize,
    pub speak: AtomicUsize,
    pub semantic_tree: AtomicUsize,
    pub optimize: AtomicUsize,
}

impl Calls {
    pub fn engine_calls(&self) -> usize {
        self.typeset.load(Ordering::SeqCst)
            + self.rasterize.load(Ordering::SeqCst)
            + self.speak.load(Ordering::SeqCst)
            + self.semantic_tree.load(Ordering::SeqCst)
            + self.optimize.load(Ordering::SeqCst)
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Switches that make individual mocks fail.
#[derive(Debug, Default)]
pub struct Faults {
    pub rasterizer: AtomicBool,
    pub optimizer: AtomicBool,
    pub typesetter_down: AtomicBool,
}

pub struct MockTypesetter {
    calls: Arc<Calls>,
    faults: Arc<Faults>,
}

#[async_trait]
impl TypesetEngine for MockTypesetter {
    async fn typeset(&self, options: &TypesetOptions) -> Result<TypesetOutput, EngineError> {
        self.calls.typeset.fetch_add(1, Ordering::SeqCst);
        if self.faults.typesetter_down.load(Ordering::SeqCst) {
            return Err(EngineError::Spawn {
                program: "mathjax-node".to_string(),
                message: "No such file or directory".to_string(),
            });
        }

        if options.math.contains("\\unsupported") {
            return Ok(TypesetOutput {
                errors: vec!["Undefined control sequence: \\unsupported".to_string()],
                ..TypesetOutput::default()
            });
        }

        let mml = match options.format {
            InputType::MathMl => options.math.clone(),
            _ => format!("<math><mi>{}</mi></math>", options.math),
        };

        Ok(TypesetOutput {
            mml: options.mml.then_some(mml),
            svg: options.svg.then(|| {
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="2ex" height="1ex" style="vertical-align: -0.1ex;" viewBox="0 0 20 10"><path fill="currentColor" d="M0 0h20v10H0z"/></svg>"#
                    .to_string()
            }),
            aux: options
                .aux_node
                .then(|| "<span class=\"math\">x</span>".to_string()),
            errors: Vec::new(),
        })
    }
}

pub struct MockChecker {
    calls: Arc<Calls>,
}

#[async_trait]
impl TexChecker for MockChecker {
    async fn feedback(
        &self,
        markup: &str,
        chemistry: bool,
    ) -> Result<CheckerFeedback, EngineError> {
        self.calls.feedback.fetch_add(1, Ordering::SeqCst);
        let raw = if markup.contains("\\badcmd") {
            json!({
                "success": false,
                "input": markup,
                "error": {"name": "SyntaxError", "message": "Illegal TeX function", "found": "\\badcmd"}
            })
        } else if chemistry {
            json!({"success": true, "input": markup, "checked": format!("{{\\ce{{{}}}}}", markup.trim())})
        } else {
            json!({"success": true, "input": markup, "checked": markup.trim()})
        };
        Ok(CheckerFeedback::from_value(raw))
    }

    async fn parse_tree(&self, markup: &str) -> Result<Value, EngineError> {
        self.calls.parse_tree.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"type": "root", "input": markup}))
    }
}

pub struct MockRasterizer {
    calls: Arc<Calls>,
    faults: Arc<Faults>,
}

#[async_trait]
impl Rasterizer for MockRasterizer {
    async fn rasterize(&self, svg: &str, _size: PixelSize) -> Result<Vec<u8>, EngineError> {
        self.calls.rasterize.fetch_add(1, Ordering::SeqCst);
        if self.faults.rasterizer.load(Ordering::SeqCst) {
            return Err(EngineError::failed("invalid SVG: unexpected end of stream"));
        }
        assert!(!svg.contains("currentColor"), "raster input keeps currentColor");
        Ok(PNG_BYTES.to_vec())
    }
}

pub struct MockSpeech {
    calls: Arc<Calls>,
}

#[async_trait]
impl SpeechEngine for MockSpeech {
    async fn semantic_tree(
        &self,
        _mathml: &str,
        _config: &SpeechConfig,
    ) -> Result<SemanticTree, EngineError> {
        self.calls.semantic_tree.fetch_add(1, Ordering::SeqCst);
        Ok(SemanticTree {
            json: json!({"stree": {"type": "superscript"}}),
            xml: "<stree><superscript/></stree>".to_string(),
        })
    }

    async fn speak(&self, _mathml: &str, _config: &SpeechConfig) -> Result<String, EngineError> {
        self.calls.speak.fetch_add(1, Ordering::SeqCst);
        Ok(SPOKEN.to_string())
    }

    async fn enrich(&self, mathml: &str, _config: &SpeechConfig) -> Result<String, EngineError> {
        Ok(mathml.replace("<math", "<math data-semantic-enriched=\"true\""))
    }
}

pub struct MockOptimizer {
    calls: Arc<Calls>,
    faults: Arc<Faults>,
}

#[async_trait]
impl SvgOptimizer for MockOptimizer {
    async fn optimize(&self, _svg: &str) -> Result<String, EngineError> {
        self.calls.optimize.fetch_add(1, Ordering::SeqCst);
        if self.faults.optimizer.load(Ordering::SeqCst) {
            return Err(EngineError::Exit {
                program: "svgo".to_string(),
                exit_code: Some(1),
                stderr: "boom".to_string(),
            });
        }
        Ok(OPTIMIZED_SVG.to_string())
    }
}

/// Service wired to call-counting mocks.
pub struct Harness {
    pub service: MathRenderService,
    pub calls: Arc<Calls>,
    pub faults: Arc<Faults>,
}

impl Harness {
    pub fn new(capabilities: Capabilities) -> Self {
        let calls = Arc::new(Calls::default());
        let faults = Arc::new(Faults::default());
        let collaborators = Collaborators {
            typesetter: Arc::new(MockTypesetter {
                calls: Arc::clone(&calls),
                faults: Arc::clone(&faults),
            }),
            checker: Arc::new(MockChecker {
                calls: Arc::clone(&calls),
            }),
            rasterizer: Arc::new(MockRasterizer {
                calls: Arc::clone(&calls),
                faults: Arc::clone(&faults),
            }),
            speech: Arc::new(MockSpeech {
                calls: Arc::clone(&calls),
            }),
            optimizer: Arc::new(MockOptimizer {
                calls: Arc::clone(&calls),
                faults: Arc::clone(&faults),
            }),
        };

        Self {
            service: MathRenderService::new(Arc::new(capabilities), collaborators),
            calls,
            faults,
        }
    }

    pub fn fail_rasterizer(&self) {
        self.faults.rasterizer.store(true, Ordering::SeqCst);
    }

    pub fn fail_optimizer(&self) {
        self.faults.optimizer.store(true, Ordering::SeqCst);
    }

    pub fn take_typesetter_down(&self) {
        self.faults.typesetter_down.store(true, Ordering::SeqCst);
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}
