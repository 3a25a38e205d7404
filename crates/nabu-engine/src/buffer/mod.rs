//! Buffer upload and readback helpers.
//!
//! Every demo follows the same lifecycle: create a buffer already filled with
//! its data, use it in one submission, and (for outputs) copy it into a
//! mappable staging buffer that is read once on the host.

mod mapped;
mod readback;

pub use mapped::{create_mapped, padded_size};
pub use readback::ReadbackBuffer;
