//! Command implementations

pub mod clean;
pub mod common;
pub mod run;
pub mod validate;
