//! General matrix multiply on the GPU.
//!
//! Bindings (group 0, compute stage):
//! - 0: first matrix, read-only storage
//! - 1: second matrix, read-only storage
//! - 2: result matrix, storage
//! - 3: per-invocation log, storage

use anyhow::{ensure, Context, Result};

use crate::buffer::{create_mapped, ReadbackBuffer};
use crate::device::Gpu;

use super::{workgroup_count, Matrix};

/// Must match `@workgroup_size` in `shaders/matmul.wgsl`.
pub const WORKGROUP_SIZE: (u32, u32) = (8, 8);

/// Log value written by every invocation before the bounds check.
pub const LOG_STARTED: f32 = 1.0;
/// Log value written by invocations that computed a result cell.
pub const LOG_COMPUTED: f32 = 2.0;

const SHADER_SRC: &str = include_str!("shaders/matmul.wgsl");

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct MatmulOutput {
    /// Decoded result matrix.
    pub product: Matrix,
    /// Raw result buffer contents (header pair + numbers).
    pub raw: Vec<f32>,
    /// One entry per invocation, row-major over the dispatched grid.
    pub log: Vec<f32>,
    pub grid: LogGrid,
}

/// Dispatch grid for a product, and the matching log layout.
///
/// The x axis walks result rows and the y axis walks result columns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LogGrid {
    pub groups_x: u32,
    pub groups_y: u32,
}

impl LogGrid {
    pub fn for_product(a: &Matrix, b: &Matrix) -> Self {
        Self {
            groups_x: workgroup_count(a.rows(), WORKGROUP_SIZE.0),
            groups_y: workgroup_count(b.cols(), WORKGROUP_SIZE.1),
        }
    }

    /// Invocations along x.
    pub fn width(self) -> u32 {
        self.groups_x * WORKGROUP_SIZE.0
    }

    /// Invocations along y.
    pub fn height(self) -> u32 {
        self.groups_y * WORKGROUP_SIZE.1
    }

    pub fn len(self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(self) -> u64 {
        (self.len() * std::mem::size_of::<f32>()) as u64
    }

    /// Log contents expected for a `rows x cols` result.
    pub fn expected_log(self, rows: u32, cols: u32) -> Vec<f32> {
        let mut log = Vec::with_capacity(self.len());
        for y in 0..self.height() {
            for x in 0..self.width() {
                log.push(if x < rows && y < cols { LOG_COMPUTED } else { LOG_STARTED });
            }
        }
        log
    }
}

/// Multiplies `a * b` with one compute dispatch and reads both the result and
/// the log buffer back.
pub fn run(gpu: &Gpu, a: &Matrix, b: &Matrix) -> Result<MatmulOutput> {
    let device = gpu.device();
    check_limits(a, b, &device.limits())?;

    let grid = LogGrid::for_product(a, b);
    let result_size = Matrix::product_byte_len(a, b);
    let log_size = grid.byte_len();

    // Inputs

    let first = create_mapped(
        device,
        "nabu matmul first matrix",
        bytemuck::cast_slice(&a.encode()),
        wgpu::BufferUsages::STORAGE,
    );
    let second = create_mapped(
        device,
        "nabu matmul second matrix",
        bytemuck::cast_slice(&b.encode()),
        wgpu::BufferUsages::STORAGE,
    );

    // Outputs

    let result = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nabu matmul result matrix"),
        size: result_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let log_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nabu matmul log"),
        size: log_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    // Bindings

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("nabu matmul bgl"),
        entries: &[
            storage_entry(0, true),
            storage_entry(1, true),
            storage_entry(2, false),
            storage_entry(3, false),
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nabu matmul bind group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: first.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: second.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: result.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: log_buffer.as_entire_binding(),
            },
        ],
    });

    // Pipeline

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nabu matmul shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("nabu matmul pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("nabu matmul pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    // Commands

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nabu matmul encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("nabu matmul pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        log::debug!(
            "matmul {}x{} * {}x{}: dispatching {}x{} workgroups",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
            grid.groups_x,
            grid.groups_y
        );
        pass.dispatch_workgroups(grid.groups_x, grid.groups_y, 1);
    }

    let result_readback = ReadbackBuffer::new(device, "nabu matmul result readback", result_size);
    result_readback.copy_from(&mut encoder, &result);

    let log_readback = ReadbackBuffer::new(device, "nabu matmul log readback", log_size);
    log_readback.copy_from(&mut encoder, &log_buffer);

    gpu.submit(encoder);

    let raw: Vec<f32> = result_readback
        .read(gpu)
        .context("failed to read matmul result")?;
    let log: Vec<f32> = log_readback.read(gpu).context("failed to read matmul log")?;

    let product = Matrix::decode(&raw).context("GPU returned a malformed result matrix")?;

    Ok(MatmulOutput {
        product,
        raw,
        log,
        grid,
    })
}

/// Checks that `a * b` is defined and fits the device before any resource is created.
///
/// wgpu panics on validation errors, so oversized dispatches and bindings are
/// rejected here instead.
pub fn check_limits(a: &Matrix, b: &Matrix, limits: &wgpu::Limits) -> Result<()> {
    a.check_product(b)?;

    let grid = LogGrid::for_product(a, b);
    let max_groups = limits.max_compute_workgroups_per_dimension;
    ensure!(
        grid.groups_x <= max_groups && grid.groups_y <= max_groups,
        "{}x{} product needs {}x{} workgroups, device allows {max_groups} per dimension",
        a.rows(),
        b.cols(),
        grid.groups_x,
        grid.groups_y
    );

    let max_binding = u64::from(limits.max_storage_buffer_binding_size);
    let max_buffer = u64::from(limits.max_buffer_size);
    let buffers = [
        ("first matrix", a.byte_len()),
        ("second matrix", b.byte_len()),
        ("result matrix", Matrix::product_byte_len(a, b)),
        ("log", grid.byte_len()),
    ];
    for (name, size) in buffers {
        ensure!(
            size <= max_binding && size <= max_buffer,
            "{name} buffer needs {size} bytes, device allows {}",
            max_binding.min(max_buffer)
        );
    }
    Ok(())
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: u32, cols: u32) -> Matrix {
        Matrix::new(rows, cols, vec![0.0; rows as usize * cols as usize]).unwrap()
    }

    #[test]
    fn shader_workgroup_size_matches_constant() {
        let attr = format!("@workgroup_size({}, {})", WORKGROUP_SIZE.0, WORKGROUP_SIZE.1);
        assert!(SHADER_SRC.contains(&attr));
    }

    #[test]
    fn grid_for_small_product_is_one_workgroup() {
        let grid = LogGrid::for_product(&m(2, 4), &m(4, 2));
        assert_eq!(grid, LogGrid { groups_x: 1, groups_y: 1 });
        assert_eq!(grid.len(), 64);
        assert_eq!(grid.byte_len(), 256);
    }

    #[test]
    fn grid_covers_non_multiple_sizes() {
        let grid = LogGrid::for_product(&m(9, 3), &m(3, 17));
        assert_eq!(grid, LogGrid { groups_x: 2, groups_y: 3 });
        assert_eq!((grid.width(), grid.height()), (16, 24));
    }

    #[test]
    fn check_limits_accepts_default_inputs() {
        assert!(check_limits(&m(2, 4), &m(4, 2), &wgpu::Limits::default()).is_ok());
    }

    #[test]
    fn check_limits_rejects_mismatched_shapes() {
        let err = check_limits(&m(2, 3), &m(2, 3), &wgpu::Limits::default()).unwrap_err();
        assert!(format!("{err:#}").contains("inner dimensions"));
    }

    #[test]
    fn check_limits_rejects_too_many_workgroups() {
        let limits = wgpu::Limits {
            max_compute_workgroups_per_dimension: 2,
            ..wgpu::Limits::default()
        };
        // 17 rows need 3 workgroups along x.
        assert!(check_limits(&m(16, 1), &m(1, 1), &limits).is_ok());
        let err = check_limits(&m(17, 1), &m(1, 1), &limits).unwrap_err();
        assert!(format!("{err:#}").contains("workgroups"));
    }

    #[test]
    fn check_limits_rejects_oversized_bindings() {
        let mut limits = wgpu::Limits::default();
        // The 1x1 * 1x1 log grid is 64 floats, the largest of the four buffers.
        limits.max_buffer_size = 255;
        let err = check_limits(&m(1, 1), &m(1, 1), &limits).unwrap_err();
        assert!(format!("{err:#}").contains("log buffer"));

        limits.max_buffer_size = 256;
        assert!(check_limits(&m(1, 1), &m(1, 1), &limits).is_ok());
    }

    #[test]
    fn expected_log_marks_result_cells() {
        let grid = LogGrid { groups_x: 1, groups_y: 1 };
        let log = grid.expected_log(2, 2);
        assert_eq!(log.len(), 64);
        // (x, y) lives at x + y * width.
        assert_eq!(log[0], LOG_COMPUTED);
        assert_eq!(log[1], LOG_COMPUTED);
        assert_eq!(log[2], LOG_STARTED);
        assert_eq!(log[8], LOG_COMPUTED);
        assert_eq!(log[9], LOG_COMPUTED);
        assert_eq!(log[16], LOG_STARTED);
        assert_eq!(log.iter().filter(|v| **v == LOG_COMPUTED).count(), 4);
    }
}
