//! Headless driver pieces for the `irma` binary: command line, configuration
//! loading and the file-backed sinks.

pub mod cli;
pub mod lineage;
pub mod view;

pub use cli::Cli;
pub use lineage::JsonLinesLineage;
pub use view::TracingView;
