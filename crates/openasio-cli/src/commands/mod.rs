//! CLI command implementations.

pub mod common;
pub mod devices;
pub mod info;
pub mod profiles;
pub mod run;
