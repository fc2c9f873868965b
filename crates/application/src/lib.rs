#![forbid(unsafe_code)]

pub mod replay;
pub mod state_aware_marker;
