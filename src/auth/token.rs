//! Credential secrets, their storage kinds, and token-endpoint grants.

pub mod grant;
pub mod kind;
pub mod secret;
