//! Model client layer for contrib-qa.
//!
//! Wraps a text-generation service behind a retrying client. The service
//! boundary ([`ModelTransport`]) performs single attempts; [`ModelClient`]
//! adds backoff and normalizes failure to `None`.

pub mod client;
pub mod response;
pub mod transport;

pub use client::{ModelClient, Sleeper, ThreadSleeper};
pub use response::ModelResponse;
pub use transport::{Message, ModelRequest, ModelTransport, OpenAiTransport, Role};
