//! Request interception and the network gateway.
//!
//! This module provides:
//! - `RequestDescriptor`: one outgoing request as the layer sees it
//! - `FetchBackend`: the trait real and scripted networks implement
//! - `HttpGateway`: the reqwest-backed production backend
//! - `RequestInterceptor`: the per-request strategy router
//!
//! GET requests are classified by path and accept type; everything else
//! passes straight through to the backend.

pub mod descriptor;
pub mod gateway;
pub mod interceptor;

pub use descriptor::{RequestDescriptor, RequestMethod};
pub use gateway::{FetchBackend, FetchError, HttpGateway};
pub use interceptor::RequestInterceptor;
