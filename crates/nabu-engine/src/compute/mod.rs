//! Compute demos.
//!
//! Each demo builds its own bind group layout and pipeline, dispatches once,
//! and reads its storage buffers back through a [`ReadbackBuffer`](crate::buffer::ReadbackBuffer).

mod matrix;

pub mod matmul;
pub mod minimal;

pub use matrix::Matrix;

/// Number of workgroups needed to cover `extent` invocations along one axis.
#[inline]
pub fn workgroup_count(extent: u32, workgroup_size: u32) -> u32 {
    extent.div_ceil(workgroup_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroup_count_rounds_up() {
        assert_eq!(workgroup_count(2, 8), 1);
        assert_eq!(workgroup_count(8, 8), 1);
        assert_eq!(workgroup_count(9, 8), 2);
        assert_eq!(workgroup_count(64, 8), 8);
    }

    #[test]
    fn workgroup_count_zero_extent() {
        assert_eq!(workgroup_count(0, 8), 0);
    }
}
