//! Command implementations that run before a workspace exists.

pub mod init;
