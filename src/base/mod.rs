//! Base types and error handling.
//!
//! - [`error::FetchError`]: failure taxonomy of the request pipeline
//! - [`error::ProxyUrlError`]: proxy-string configuration failures

pub mod error;
