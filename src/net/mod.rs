//! Networking: wire types, HTTP transport, and the session-aware API client.

pub mod api;
pub mod client;
pub mod error;
pub mod refresh;
pub mod transport;
pub mod types;

#[cfg(test)]
#[path = "test_helpers.rs"]
pub(crate) mod test_helpers;
