use std::sync::mpsc;

use anyhow::{anyhow, Context, Result};
use bytemuck::Pod;

use crate::device::Gpu;

/// Host-mappable copy destination for a GPU output.
///
/// Usage:
/// - create it next to the output buffer
/// - record [`copy_from`](Self::copy_from) into the same encoder as the pass
/// - submit, then call [`read`](Self::read) once
pub struct ReadbackBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

impl ReadbackBuffer {
    pub fn new(device: &wgpu::Device, label: &str, size: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { buffer, size }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Records a full-size copy from `source` into this buffer.
    pub fn copy_from(&self, encoder: &mut wgpu::CommandEncoder, source: &wgpu::Buffer) {
        encoder.copy_buffer_to_buffer(source, 0, &self.buffer, 0, self.size);
    }

    /// Maps the buffer, copies its contents out as `T`, and unmaps it.
    ///
    /// Blocks on a device poll until the map callback has fired, so the copy
    /// must already have been submitted.
    pub fn read<T: Pod>(&self, gpu: &Gpu) -> Result<Vec<T>> {
        let slice = self.buffer.slice(..);

        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        gpu.wait_idle()?;

        receiver
            .recv()
            .context("buffer map callback was dropped")?
            .context("failed to map readback buffer")?;

        let out = {
            let view = slice.get_mapped_range();
            bytemuck::try_cast_slice::<u8, T>(&view)
                .map_err(|e| anyhow!("readback size {} is not a whole number of elements: {e:?}", self.size))?
                .to_vec()
        };

        self.buffer.unmap();
        Ok(out)
    }
}
