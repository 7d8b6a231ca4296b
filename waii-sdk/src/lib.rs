//! # Waii SDK
//!
//! `waii-sdk` is a client library for the Waii natural-language-to-SQL
//! service. Every capability of the service is exposed twice: as a blocking
//! module for plain Rust programs and as an async wrapper that offloads the
//! blocking call to the worker pool of the current Tokio runtime.
//!
//! ## Key Components
//!
//! * **[`Waii`](client::Waii) & [`AsyncWaii`](client::AsyncWaii):** The main entry points. Connecting
//!   resolves a shared HTTP session for the `(url, api_key)` pair, wires every
//!   feature module to it, and activates the first database connection so
//!   scoped calls work immediately.
//! * **[`WaiiHttpClient`](http::client::WaiiHttpClient):** The transport every module goes through.
//!   It validates requests before the network, injects the session scope and
//!   identity fields, and maps remote diagnostics into [`ApiError`](http::client::ApiError).
//! * **[`StrictFields`](model::StrictFields) & [`ExtraFields`](model::ExtraFields):** The validation seam. Models
//!   capture unknown JSON fields permissively on decode and reject them
//!   explicitly before a request is sent.
//!
//! ## Feature modules
//!
//! Each submodule of [`client`] covers one surface of the service: databases
//! and catalogs, query generation, semantic context, chat, charts, history,
//! users and access keys, access rules, settings, and semantic layer dumps.
//!
//! ## Re-exports
//!
//! This crate re-exports `reqwest` and `serde_json` to ensure that consumers
//! use compatible versions of these underlying dependencies.
//!
//! See the README.md for more details about usage.
pub mod client;
pub mod facade;
pub mod http;
pub mod model;

// Re-exports
pub use reqwest;
pub use serde_json;

pub use crate::client::{AsyncWaii, ConnectError, Waii, DEFAULT_URL};
pub use crate::http::client::{ApiError, ClientBuildError, WaiiHttpClient};
pub use crate::model::{ExtraFields, SchemaError, StrictFields};
