//! HTTP client for the driving-school backend API.

mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;
