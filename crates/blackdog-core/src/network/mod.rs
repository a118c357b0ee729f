//! Network utilities for HTTP operations.

mod client;

pub use client::HttpClient;
