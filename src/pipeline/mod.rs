//! Question-answering pipeline and its presentation boundary.

pub mod orchestrator;
pub mod presenter;

pub use orchestrator::{Answer, Outcome, Pipeline};
pub use presenter::{Notice, Presenter, Severity, Stage, Transcript};
