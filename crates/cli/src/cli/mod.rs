pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, FormatArg, ListArgs, SynthArgs};
pub use output::{OutputFormat, OutputFormatter};
