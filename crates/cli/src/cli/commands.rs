use clap::{Args, Parser, Subcommand, ValueEnum};
use nbstack_core::TemplateFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "nbstack",
    version,
    about = "Synthesizes the SageMaker notebook CloudFormation stack"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Explicit log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the stack into a cloud assembly directory
    Synth(SynthArgs),
    /// Run the structural validation rules against the declaration
    Validate,
    /// List the declared resources
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Output directory for templates and manifest (default: NBSTACK_OUT_DIR or nbstack.out)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template rendering
    #[arg(long, value_enum, default_value = "json")]
    pub format: FormatArg,

    /// Print the template to stdout instead of writing the assembly
    #[arg(long)]
    pub print: bool,

    /// Skip the structural validation rules
    #[arg(long)]
    pub no_validate: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ListFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for TemplateFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => TemplateFormat::Json,
            FormatArg::Yaml => TemplateFormat::Yaml,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormatArg {
    Text,
    Json,
}
