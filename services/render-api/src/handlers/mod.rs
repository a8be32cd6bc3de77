//! HTTP request handlers for the render API.

pub mod health;
pub mod render;

pub use health::{health_handler, metrics_handler, status_handler};
pub use render::{render_form_handler, render_handler, RenderParams};
