use anyhow::{ensure, Context, Result};

use crate::buffer::ReadbackBuffer;
use crate::device::Gpu;

use super::RenderedImage;

/// Depth/stencil format used by the extended triangle demo.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Offscreen canvas configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// Color the render pass clears to before drawing.
    pub clear_color: wgpu::Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            format: wgpu::TextureFormat::Bgra8Unorm,
            clear_color: wgpu::Color::WHITE,
        }
    }
}

impl CanvasConfig {
    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// Color texture standing in for the canvas' current texture.
pub struct ColorTarget {
    config: CanvasConfig,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ColorTarget {
    pub fn new(device: &wgpu::Device, config: CanvasConfig) -> Result<Self> {
        check_canvas(&config, &device.limits())?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("nabu canvas color"),
            size: config.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            config,
            texture,
            view,
        })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Records a copy of the whole texture into a new staging buffer.
    ///
    /// Rows are padded to `COPY_BYTES_PER_ROW_ALIGNMENT` in the buffer.
    pub fn encode_readback(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
    ) -> ReadbackBuffer {
        let padded_row = self.padded_bytes_per_row();
        let readback = ReadbackBuffer::new(
            device,
            "nabu canvas readback",
            u64::from(padded_row) * u64::from(self.config.height),
        );

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: readback.buffer(),
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.config.height),
                },
            },
            self.config.extent(),
        );

        readback
    }

    /// Maps a buffer filled by [`encode_readback`](Self::encode_readback).
    pub fn finish_readback(&self, gpu: &Gpu, readback: &ReadbackBuffer) -> Result<RenderedImage> {
        let padded: Vec<u8> = readback.read(gpu).context("failed to read canvas texture")?;
        let bytes = unpad_rows(
            &padded,
            self.unpadded_bytes_per_row() as usize,
            self.padded_bytes_per_row() as usize,
            self.config.height as usize,
        );
        Ok(RenderedImage::new(
            self.config.width,
            self.config.height,
            self.config.format,
            bytes,
        ))
    }

    fn unpadded_bytes_per_row(&self) -> u32 {
        // Format was validated in `new`.
        self.config.width * bytes_per_pixel(self.config.format).unwrap_or(4)
    }

    fn padded_bytes_per_row(&self) -> u32 {
        padded_bytes_per_row(self.unpadded_bytes_per_row())
    }
}

/// Depth/stencil texture matching a canvas.
pub struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, config: &CanvasConfig) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("nabu canvas depth"),
            size: config.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Validates a canvas before any texture is created.
///
/// Readback and `RenderedImage` assume 4-byte texels, and wgpu panics on
/// textures larger than the device allows.
pub fn check_canvas(config: &CanvasConfig, limits: &wgpu::Limits) -> Result<()> {
    ensure!(
        config.width > 0 && config.height > 0,
        "canvas has zero size ({}x{})",
        config.width,
        config.height
    );
    let max = limits.max_texture_dimension_2d;
    ensure!(
        config.width <= max && config.height <= max,
        "canvas {}x{} exceeds the device texture limit of {max}",
        config.width,
        config.height
    );
    ensure!(
        bytes_per_pixel(config.format) == Some(4),
        "canvas format {:?} is not a 4-byte color format",
        config.format
    );
    Ok(())
}

fn bytes_per_pixel(format: wgpu::TextureFormat) -> Option<u32> {
    format.block_copy_size(None)
}

/// Rounds a row length up to `COPY_BYTES_PER_ROW_ALIGNMENT` (256).
pub(super) fn padded_bytes_per_row(unpadded: u32) -> u32 {
    wgpu::util::align_to(unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}

/// Drops the per-row padding of a texture copy.
pub(super) fn unpad_rows(padded: &[u8], unpadded_row: usize, padded_row: usize, rows: usize) -> Vec<u8> {
    padded
        .chunks(padded_row)
        .take(rows)
        .flat_map(|row| &row[..unpadded_row.min(row.len())])
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_bytes_per_row_aligns_to_256() {
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(640 * 4), 2560);
        assert_eq!(padded_bytes_per_row(100 * 4), 512);
    }

    #[test]
    fn unpad_rows_strips_trailing_bytes() {
        // Two rows of 3 bytes, each padded to 4.
        let padded = [1, 2, 3, 0, 4, 5, 6, 0];
        assert_eq!(unpad_rows(&padded, 3, 4, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn unpad_rows_without_padding_is_identity() {
        let padded = [1, 2, 3, 4];
        assert_eq!(unpad_rows(&padded, 2, 2, 2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn default_canvas_is_white_bgra() {
        let config = CanvasConfig::default();
        assert_eq!(config.format, wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(config.clear_color, wgpu::Color::WHITE);
        assert_eq!(bytes_per_pixel(config.format), Some(4));
    }

    #[test]
    fn check_canvas_accepts_default() {
        assert!(check_canvas(&CanvasConfig::default(), &wgpu::Limits::default()).is_ok());
    }

    #[test]
    fn check_canvas_rejects_non_rgba8_formats() {
        for format in [
            wgpu::TextureFormat::R8Unorm,
            wgpu::TextureFormat::Rg8Unorm,
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureFormat::R32Float,
            DEPTH_FORMAT,
        ] {
            let config = CanvasConfig {
                format,
                ..Default::default()
            };
            assert!(check_canvas(&config, &wgpu::Limits::default()).is_err(), "{format:?}");
        }
    }

    #[test]
    fn check_canvas_rejects_zero_size() {
        let config = CanvasConfig {
            height: 0,
            ..Default::default()
        };
        assert!(check_canvas(&config, &wgpu::Limits::default()).is_err());
    }

    #[test]
    fn check_canvas_rejects_oversized_texture() {
        let limits = wgpu::Limits::default();
        let max = limits.max_texture_dimension_2d;

        let at_limit = CanvasConfig {
            width: max,
            height: 1,
            ..Default::default()
        };
        assert!(check_canvas(&at_limit, &limits).is_ok());

        let over = CanvasConfig {
            width: max + 1,
            ..Default::default()
        };
        let err = check_canvas(&over, &limits).unwrap_err();
        assert!(format!("{err:#}").contains("texture limit"));
    }

    #[test]
    fn depth_format_is_not_readable_as_color() {
        assert_eq!(bytes_per_pixel(DEPTH_FORMAT), None);
    }
}
