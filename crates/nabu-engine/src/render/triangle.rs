//! Solid red triangle on a white canvas.

use anyhow::Result;

use crate::buffer::create_mapped;
use crate::device::Gpu;

use super::common::{Position, TRIANGLE_INDICES, TRIANGLE_POSITIONS};
use super::{CanvasConfig, ColorTarget, RenderedImage};

const SHADER_SRC: &str = include_str!("shaders/triangle.wgsl");

/// Draws one indexed triangle into a fresh canvas and reads it back.
///
/// The pipeline uses an automatic layout (no bindings) and default primitive state.
pub fn run(gpu: &Gpu, canvas: CanvasConfig) -> Result<RenderedImage> {
    let device = gpu.device();
    let target = ColorTarget::new(device, canvas)?;

    let position_vbo = create_mapped(
        device,
        "nabu triangle positions",
        bytemuck::cast_slice(&TRIANGLE_POSITIONS),
        wgpu::BufferUsages::VERTEX,
    );
    let ibo = create_mapped(
        device,
        "nabu triangle indices",
        bytemuck::cast_slice(&TRIANGLE_INDICES),
        wgpu::BufferUsages::INDEX,
    );

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nabu triangle shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("nabu triangle pipeline"),
        layout: None,

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Position::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: canvas.format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nabu triangle encoder"),
    });

    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("nabu triangle pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(canvas.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipeline);
        rpass.set_vertex_buffer(0, position_vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..TRIANGLE_INDICES.len() as u32, 0, 0..1);
    }

    let readback = target.encode_readback(device, &mut encoder);
    gpu.submit(encoder);

    target.finish_readback(gpu, &readback)
}
