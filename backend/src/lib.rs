//! Backend library for the Amity companion app.
//!
//! The crate is organised hexagonally:
//!
//! - [`domain`] holds the pure eligibility gate, the verification-lifecycle
//!   maintenance service, and the ports both depend on.
//! - [`inbound`] adapts HTTP requests onto the domain.
//! - [`outbound`] adapts the domain's ports onto PostgreSQL and the
//!   transactional-email provider.
//! - [`server`] wires configuration, OpenAPI docs, and bootstrap.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;

pub use server::doc::ApiDoc;
