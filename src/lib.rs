pub mod config;
pub mod outbound;
pub mod pipeline;

pub use config::RunConfig;
pub use pipeline::{Pipeline, RunSummary};
