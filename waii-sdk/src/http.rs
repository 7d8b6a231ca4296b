//! # HTTP Transport
//!
//! This module implements the single wire path every SDK operation goes
//! through: one JSON-over-HTTP POST per call, stateless on the wire except
//! for the session identity injected into each request body.
//!
//! * [`client::WaiiHttpClient`] owns the connection settings and performs
//!   the request cycle (validate, inject, send, decode).
//! * [`session::SessionContext`] holds the mutable identity shared by every
//!   feature module created from the same client.
pub mod client;
pub mod session;
