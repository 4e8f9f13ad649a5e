//! Transport layer for the query service.
//!
//! The pipeline is transport-agnostic; HTTP is the only surface shipped.

pub mod http;

pub use http::HttpTransport;

use crate::error::PipelineResult;
use std::future::Future;

/// A way of exposing the pipeline to clients.
pub trait Transport: Send + Sync {
    /// Start the transport and begin handling requests.
    ///
    /// This method should block until the transport is shut down.
    fn run(&self) -> impl Future<Output = PipelineResult<()>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}
