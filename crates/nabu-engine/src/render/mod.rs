//! Offscreen rasterization demos.
//!
//! The browser canvas is replaced by a [`ColorTarget`] texture. After the
//! single render pass, the texture is copied into a staging buffer within the
//! same command buffer and returned as a [`RenderedImage`].
//!
//! Convention:
//! - vertex positions are already in clip space (no viewport uniform)
//! - vertex data is non-interleaved: one buffer per attribute

mod common;
mod rendered;
mod target;

pub mod triangle;
pub mod triangle_extended;

pub use common::{Mat4, IDENTITY};
pub use rendered::RenderedImage;
pub use target::{check_canvas, CanvasConfig, ColorTarget, DepthTarget, DEPTH_FORMAT};
