//! HTTP client for the Todo Manager REST API.
//!
//! [`HttpTargetService`] implements the harness's `TargetService` seam over
//! `reqwest`, generating a random payload for every create and update.

pub mod error;
pub mod http;
pub mod payload;

pub use error::{ClientError, ClientResult};
pub use http::HttpTargetService;
pub use payload::{Payload, ProjectPayload, TodoPayload};
