//! Foundation utilities shared by all spatial modules

pub mod logging;
pub mod math;
