//! Utility modules shared by the ranking clients.
//!
//! - [`HttpClient`]: reqwest client wrapper with the crate user agent and timeouts

mod http;

pub use http::{HttpClient, USER_AGENT};
