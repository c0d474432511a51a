//! Command line layer: argument parsing (`args`) and the glue that turns
//! the arguments into a pipeline run (`runner`).
pub mod args;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
