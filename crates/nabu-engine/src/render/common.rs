//! Geometry and GPU types shared by the triangle demos.

use bytemuck::{Pod, Zeroable};

// ── positions ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct Position {
    pub xyz: [f32; 3],
}

impl Position {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Position>() as u64, // x y z
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const TRIANGLE_POSITIONS: [Position; 3] = [
    Position { xyz: [1.0, -1.0, 0.0] },
    Position { xyz: [-1.0, -1.0, 0.0] },
    Position { xyz: [0.0, 1.0, 0.0] },
];

pub(super) const TRIANGLE_INDICES: [u16; 3] = [0, 1, 2];

// ── colors ────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct VertexColor {
    pub rgb: [f32; 3],
}

impl VertexColor {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexColor>() as u64, // r g b
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const TRIANGLE_COLORS: [VertexColor; 3] = [
    VertexColor { rgb: [1.0, 0.0, 0.0] },
    VertexColor { rgb: [0.0, 1.0, 0.0] },
    VertexColor { rgb: [0.0, 0.0, 1.0] },
];

// ── transform uniform ─────────────────────────────────────────────────────

/// Column-major 4x4 matrix, as WGSL `mat4x4<f32>` expects.
pub type Mat4 = [[f32; 4]; 4];

pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct TransformUniform {
    pub model_view_proj: Mat4,
}

/// Returns the `wgpu` minimum binding size for the transform uniform buffer.
pub(super) fn transform_ubo_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<TransformUniform>() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_strides_are_three_floats() {
        assert_eq!(Position::layout().array_stride, 12);
        assert_eq!(VertexColor::layout().array_stride, 12);
    }

    #[test]
    fn transform_uniform_is_one_mat4() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
        assert_eq!(transform_ubo_min_binding_size().map(|n| n.get()), Some(64));
    }

    #[test]
    fn identity_is_column_major_identity() {
        for (c, column) in IDENTITY.iter().enumerate() {
            for (r, v) in column.iter().enumerate() {
                assert_eq!(*v, if r == c { 1.0 } else { 0.0 });
            }
        }
    }
}
