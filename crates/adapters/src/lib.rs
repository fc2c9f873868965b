#![deny(unsafe_code)]

pub mod audit;
pub mod storage;
