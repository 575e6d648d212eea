//! Sieve of Eratosthenes as a self-extending chain of processes.
//!
//! A source process writes candidates into a pipe. The orchestrator reads the
//! first value from the newest pipe, spawns a filter process for it and moves
//! on to that filter's output. Every filter announces its prime once and passes
//! along only the values it does not divide.

mod error;
mod filter;
mod orchestrator;
pub mod process;
mod reporter;
mod source;

pub use error::PipelineError;
pub use filter::{Filter, FilterState, FilterStats};
pub use orchestrator::{Pipeline, PipelineSummary};
pub use process::{StageExit, StageHandle, StageRole};
pub use reporter::Reporter;
pub use source::Source;
