//! Vertex-colored triangle with a depth/stencil attachment and a uniform
//! model-view-projection transform.
//!
//! Phases are bracketed by [`PerfMarks`]; spans are logged at debug level and
//! returned alongside the image.

use anyhow::Result;

use crate::buffer::create_mapped;
use crate::device::Gpu;
use crate::time::{PerfMarks, PerfSpan};

use super::common::{
    transform_ubo_min_binding_size, Position, TransformUniform, VertexColor, TRIANGLE_COLORS,
    TRIANGLE_INDICES, TRIANGLE_POSITIONS,
};
use super::{CanvasConfig, ColorTarget, DepthTarget, Mat4, RenderedImage, DEPTH_FORMAT, IDENTITY};

const SHADER_SRC: &str = include_str!("shaders/triangle_extended.wgsl");

/// Mark names, in recording order.
pub const MARKS: [&str; 5] = ["start", "resources", "pipeline", "encoded", "submitted"];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangleExtendedParams {
    /// Column-major transform applied to every vertex.
    pub model_view_proj: Mat4,
}

impl Default for TriangleExtendedParams {
    fn default() -> Self {
        Self {
            model_view_proj: IDENTITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriangleExtendedOutput {
    pub image: RenderedImage,
    /// Host-side durations between consecutive [`MARKS`].
    pub spans: Vec<PerfSpan>,
}

pub fn run(
    gpu: &Gpu,
    canvas: CanvasConfig,
    params: TriangleExtendedParams,
) -> Result<TriangleExtendedOutput> {
    let mut marks = PerfMarks::new();
    marks.mark(MARKS[0]);

    let device = gpu.device();
    let target = ColorTarget::new(device, canvas)?;
    let depth = DepthTarget::new(device, &canvas);

    let position_vbo = create_mapped(
        device,
        "nabu triangle-ext positions",
        bytemuck::cast_slice(&TRIANGLE_POSITIONS),
        wgpu::BufferUsages::VERTEX,
    );
    let color_vbo = create_mapped(
        device,
        "nabu triangle-ext colors",
        bytemuck::cast_slice(&TRIANGLE_COLORS),
        wgpu::BufferUsages::VERTEX,
    );
    let ibo = create_mapped(
        device,
        "nabu triangle-ext indices",
        bytemuck::cast_slice(&TRIANGLE_INDICES),
        wgpu::BufferUsages::INDEX,
    );
    let transform_ubo = create_mapped(
        device,
        "nabu triangle-ext transform ubo",
        bytemuck::bytes_of(&TransformUniform {
            model_view_proj: params.model_view_proj,
        }),
        wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    );

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("nabu triangle-ext bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: transform_ubo_min_binding_size(),
            },
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nabu triangle-ext bind group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &transform_ubo,
                offset: 0,
                size: transform_ubo_min_binding_size(),
            }),
        }],
    });

    marks.mark(MARKS[1]);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nabu triangle-ext shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("nabu triangle-ext pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("nabu triangle-ext pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Position::layout(), VertexColor::layout()],
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

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    marks.mark(MARKS[2]);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nabu triangle-ext encoder"),
    });

    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("nabu triangle-ext pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(canvas.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipeline);
        rpass.set_viewport(0.0, 0.0, canvas.width as f32, canvas.height as f32, 0.0, 1.0);
        rpass.set_scissor_rect(0, 0, canvas.width, canvas.height);
        rpass.set_vertex_buffer(0, position_vbo.slice(..));
        rpass.set_vertex_buffer(1, color_vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw_indexed(0..TRIANGLE_INDICES.len() as u32, 0, 0..1);
    }

    let readback = target.encode_readback(device, &mut encoder);
    marks.mark(MARKS[3]);

    gpu.submit(encoder);
    marks.mark(MARKS[4]);

    marks.log_summary("triangle-extended");

    let image = target.finish_readback(gpu, &readback)?;
    Ok(TriangleExtendedOutput {
        image,
        spans: marks.spans(),
    })
}
