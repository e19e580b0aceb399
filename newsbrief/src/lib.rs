// Library interface for newsbrief modules
// This allows tests and the binary to import modules

pub mod llm;
pub mod pipeline;
pub mod server;
pub mod terminal;
pub mod timeout;
pub mod topics;

pub use pipeline::{FailureKind, NewsOutcome, NewsPipeline, NewsResult, Source};
