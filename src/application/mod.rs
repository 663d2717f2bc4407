//! Application services: the render pipeline and the batch driver.

pub mod batch;
pub mod error;
pub mod render;
