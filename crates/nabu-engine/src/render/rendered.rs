use std::path::Path;

use anyhow::{ensure, Context, Result};

/// CPU copy of a rendered canvas, rows tightly packed, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    bytes: Vec<u8>,
}

impl RenderedImage {
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            format,
            bytes,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Raw texel bytes in the canvas format.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pixel at `(x, y)` as RGBA regardless of the canvas channel order.
    ///
    /// `None` outside the image, or when the bytes are shorter than 4 per pixel.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px: [u8; 4] = self.bytes.get(i..i + 4)?.try_into().ok()?;
        Some(if self.is_bgra() { swizzle_bgra(px) } else { px })
    }

    /// Converts the whole image to tightly packed RGBA8.
    pub fn to_rgba8(&self) -> Vec<u8> {
        if !self.is_bgra() {
            return self.bytes.clone();
        }
        self.bytes
            .chunks_exact(4)
            .flat_map(|px| swizzle_bgra([px[0], px[1], px[2], px[3]]))
            .collect()
    }

    /// Writes the image as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure!(
            matches!(
                self.format,
                wgpu::TextureFormat::Bgra8Unorm
                    | wgpu::TextureFormat::Bgra8UnormSrgb
                    | wgpu::TextureFormat::Rgba8Unorm
                    | wgpu::TextureFormat::Rgba8UnormSrgb
            ),
            "cannot encode {:?} as PNG",
            self.format
        );

        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
            .context("image buffer does not match its dimensions")?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write {}", path.display()))?;

        log::info!("wrote {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }

    fn is_bgra(&self) -> bool {
        matches!(
            self.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        )
    }
}

#[inline]
fn swizzle_bgra([b, g, r, a]: [u8; 4]) -> [u8; 4] {
    [r, g, b, a]
}
