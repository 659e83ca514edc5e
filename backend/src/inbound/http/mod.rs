//! HTTP inbound adapter exposing REST endpoints.

pub mod eligibility;
pub mod error;
pub mod health;
pub mod maintenance;
pub mod routes;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
