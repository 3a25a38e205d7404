//! Nabu engine crate.
//!
//! Headless GPU runtime pieces shared by the demos: device acquisition,
//! buffer upload/readback, offscreen targets, timing marks and logging.

pub mod device;
pub mod buffer;
pub mod time;

pub mod logging;
pub mod compute;
pub mod render;
