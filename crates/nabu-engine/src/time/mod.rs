//! Time subsystem.
//!
//! Provides coarse performance marks for one-shot demos:
//! - call `mark()` at each phase boundary
//! - read back `spans()` or `measure()` after submission

mod perf_marks;

pub use perf_marks::{Mark, PerfMarks, PerfSpan};
