use std::sync::Arc;

use crate::application::render::MathRenderService;

#[derive(Clone)]
pub struct HttpState {
    pub service: Arc<MathRenderService>,
}

impl HttpState {
    pub fn new(service: MathRenderService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
