//! Server configuration and bootstrap helpers.

pub mod config;
pub mod doc;
