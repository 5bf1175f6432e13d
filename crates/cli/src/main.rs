use nbstack_cli::cli::commands::{CliArgs, Commands, ListArgs, ListFormatArg, SynthArgs};
use nbstack_cli::cli::output::{OutputFormat, OutputFormatter};
use nbstack_cli::{NAME, VERSION};
use nbstack_core::{
    sagemaker_notebook_stack, synthesize, App, NbstackConfig, Stack, TemplateFormat, Validator,
};

use clap::Parser;
use std::env;
use std::process;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Synth(synth_args) => handle_synth(synth_args, args.quiet),
        Commands::Validate => handle_validate(),
        Commands::List(list_args) => handle_list(list_args),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if let Some(level_str) = &args.log_level {
            parse_level(level_str)
        } else if args.verbose {
            Level::DEBUG
        } else if args.quiet {
            Level::ERROR
        } else {
            let level_str = env::var("NBSTACK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("nbstack={}", level).parse().unwrap())
                .add_directive(format!("nbstack_cli={}", level).parse().unwrap())
                .add_directive(format!("nbstack_core={}", level).parse().unwrap());
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_stack() -> Option<Stack> {
    match sagemaker_notebook_stack() {
        Ok(stack) => Some(stack),
        Err(e) => {
            error!("Failed to build stack declaration: {}", e);
            None
        }
    }
}

fn handle_synth(args: &SynthArgs, quiet: bool) -> i32 {
    info!("Synthesizing stack");

    let Some(stack) = build_stack() else {
        return 1;
    };

    if args.no_validate {
        debug!("Validation skipped");
    } else if let Err(e) = Validator::new().validate(&stack) {
        error!("Validation failed: {}", e);
        return 2;
    }

    let format: TemplateFormat = args.format.into();

    if args.print {
        let template = match synthesize(&stack) {
            Ok(t) => t,
            Err(e) => {
                error!("Synthesis failed: {}", e);
                return 1;
            }
        };
        let rendered = match format {
            TemplateFormat::Json => template.to_json(),
            TemplateFormat::Yaml => template.to_yaml(),
        };
        match rendered {
            Ok(out) => {
                print!("{}", out);
                0
            }
            Err(e) => {
                error!("Failed to render template: {}", e);
                1
            }
        }
    } else {
        let config = NbstackConfig::default();
        let out_dir = args.output.clone().unwrap_or(config.out_dir);
        let mut app = App::new().with_out_dir(out_dir).with_format(format);
        app.add_stack(stack);

        match app.synth() {
            Ok(assembly) => {
                if !quiet {
                    for (stack_name, artifact) in &assembly.templates {
                        println!(
                            "{}: {} ({})",
                            stack_name,
                            assembly.directory.join(&artifact.file).display(),
                            artifact.digest
                        );
                    }
                }
                0
            }
            Err(e) => {
                error!("Synthesis failed: {:#}", e);
                1
            }
        }
    }
}

fn handle_validate() -> i32 {
    info!("Validating stack declaration");

    let Some(stack) = build_stack() else {
        return 1;
    };

    let outcomes = Validator::new().report(&stack);
    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => println!("ok   {}", outcome.rule),
            Err(e) => {
                failures += 1;
                println!("FAIL {}: {}", outcome.rule, e);
            }
        }
    }

    if failures > 0 {
        error!("{} of {} rules failed", failures, outcomes.len());
        1
    } else {
        info!("All {} rules passed", outcomes.len());
        0
    }
}

fn handle_list(args: &ListArgs) -> i32 {
    let Some(stack) = build_stack() else {
        return 1;
    };

    let template = match synthesize(&stack) {
        Ok(t) => t,
        Err(e) => {
            error!("Synthesis failed: {}", e);
            return 1;
        }
    };

    let format = match args.format {
        ListFormatArg::Text => OutputFormat::Text,
        ListFormatArg::Json => OutputFormat::Json,
    };
    let with_header = atty::is(atty::Stream::Stdout);

    match OutputFormatter::new(format).format_resources(&stack, &template, with_header) {
        Ok(out) => {
            print!("{}", out);
            if format == OutputFormat::Json {
                println!();
            }
            0
        }
        Err(e) => {
            error!("Failed to format output: {}", e);
            1
        }
    }
}
