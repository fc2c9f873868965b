//! Alert identity, lifecycle status and the persisted state-event model.

pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod marker;
pub mod operation;
pub mod query;
pub mod transition;
