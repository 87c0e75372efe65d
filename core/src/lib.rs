//! Request core for LaunchDarkly REST API blocks.
//!
//! # Overview
//! Every block performs the same straight-line sequence: substitute path
//! parameters, route the rest to a query string or JSON body, make one
//! authenticated HTTP call, and hand back the parsed JSON. This crate owns
//! that sequence.
//!
//! # Design
//! - `ApiClient` is stateless: it holds only validated `Credentials`.
//! - Request building and response parsing are pure; the single round-trip
//!   goes through the `Transport` trait (`UreqTransport` by default).
//! - `filter_defined` drops absent parameters and keeps explicit nulls.
//! - `catalog` is a declarative endpoint table with one generic dispatcher.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;

pub use catalog::Endpoint;
pub use client::{execute, ApiClient};
pub use config::{Credentials, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::filter_defined;
pub use transport::{Transport, UreqTransport};
pub use types::{Params, RequestOptions};
