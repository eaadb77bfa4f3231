//! CLI command implementations

pub mod init;
pub mod simulate;
pub mod validate;
