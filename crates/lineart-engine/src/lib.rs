//! lineart engine crate.
//!
//! Owns the platform + GPU runtime pieces and the immediate-mode line
//! renderer used by the demo binary.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
