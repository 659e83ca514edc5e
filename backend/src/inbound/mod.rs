//! Inbound adapters translating transport concerns into domain calls.

pub mod http;
