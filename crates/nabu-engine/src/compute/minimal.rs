//! Smallest useful compute dispatch: one 2x2 workgroup filling a 4-float buffer.

use anyhow::{Context, Result};

use crate::buffer::ReadbackBuffer;
use crate::device::Gpu;

/// Must match `@workgroup_size` in `shaders/minimal.wgsl`.
pub const WORKGROUP_SIZE: (u32, u32) = (2, 2);

/// Floats in the output buffer, one per invocation.
pub const OUTPUT_LEN: usize = (WORKGROUP_SIZE.0 * WORKGROUP_SIZE.1) as usize;

const SHADER_SRC: &str = include_str!("shaders/minimal.wgsl");

/// Dispatches a single workgroup in which every invocation writes `1.0` to its slot.
pub fn run(gpu: &Gpu) -> Result<Vec<f32>> {
    let device = gpu.device();
    let size = (OUTPUT_LEN * std::mem::size_of::<f32>()) as u64;

    let output = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nabu minimal output"),
        size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("nabu minimal bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nabu minimal bind group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: output.as_entire_binding(),
        }],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nabu minimal shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("nabu minimal pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("nabu minimal pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nabu minimal encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("nabu minimal pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(1, 1, 1);
    }

    let readback = ReadbackBuffer::new(device, "nabu minimal readback", size);
    readback.copy_from(&mut encoder, &output);

    gpu.submit(encoder);

    readback.read(gpu).context("failed to read minimal compute output")
}
