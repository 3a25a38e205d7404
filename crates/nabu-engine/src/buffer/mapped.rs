use wgpu::util::DeviceExt;

/// Rounds `len` up to the buffer copy alignment (4 bytes).
///
/// A `u16` index list of three entries is 6 bytes and must be uploaded as 8.
#[inline]
pub fn padded_size(len: u64) -> u64 {
    wgpu::util::align_to(len, wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Creates a buffer mapped at creation, fills it with `contents` and unmaps it.
///
/// Trailing padding bytes are zero.
pub fn create_mapped(
    device: &wgpu::Device,
    label: &str,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    let size = padded_size(contents.len() as u64);
    log::debug!("buffer {label:?}: {} bytes (padded to {size})", contents.len());

    let mut padded = contents.to_vec();
    padded.resize(size as usize, 0);

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: &padded,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_size_keeps_aligned_lengths() {
        assert_eq!(padded_size(0), 0);
        assert_eq!(padded_size(4), 4);
        assert_eq!(padded_size(40), 40);
    }

    #[test]
    fn padded_size_rounds_up_to_four() {
        assert_eq!(padded_size(1), 4);
        assert_eq!(padded_size(6), 8); // three u16 indices
        assert_eq!(padded_size(7), 8);
    }
}
