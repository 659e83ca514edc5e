//! Transactional email adapters.

pub mod resend;

pub use resend::{ResendConfig, ResendMailer};
