//! CLI command implementations

pub mod input;
pub mod scan;
pub mod settings;
pub mod sync;
pub mod validate;
