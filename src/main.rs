//! ticketboard - versioned ticket store
//!
//! Entry point of the `ticketboard` binary: parses arguments, loads
//! configuration, installs logging and dispatches to the command handlers.

use clap::Parser;
use std::process;
use ticketboard::cli::handlers::{HandlerContext, handle_config_show};
use ticketboard::cli::{Cli, Commands, ConfigCommands, OutputFormatter};
use ticketboard::error::{Result, TicketboardError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Load configuration, set up logging and run the requested command
fn run(cli: Cli, formatter: OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::new(cli.config.as_deref(), formatter)?;
    init_logging(cli.verbose, &ctx.config.logging.level);
    dispatch_command(cli.command, &ctx)
}

/// `RUST_LOG` wins, then `--verbose`, then `logging.level`
fn init_logging(verbose: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { level }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dispatch_command(command: Commands, ctx: &HandlerContext) -> Result<()> {
    match command {
        Commands::Serve { host, port, in_memory } => dispatch_serve(ctx, host, port, in_memory),
        Commands::Migrate => dispatch_migrate(ctx),
        Commands::Config { command } => match command {
            ConfigCommands::Show => handle_config_show(ctx),
        },
    }
}

#[cfg(feature = "api")]
fn dispatch_serve(ctx: &HandlerContext, host: Option<String>, port: Option<u16>, in_memory: bool) -> Result<()> {
    use ticketboard::cli::handlers::{ServeOptions, handle_serve};
    handle_serve(ctx, ServeOptions { host, port, in_memory })
}

#[cfg(not(feature = "api"))]
fn dispatch_serve(_: &HandlerContext, _: Option<String>, _: Option<u16>, _: bool) -> Result<()> {
    Err(TicketboardError::Config("this build has no HTTP API; enable the `api` feature".into()))
}

#[cfg(feature = "postgres")]
fn dispatch_migrate(ctx: &HandlerContext) -> Result<()> {
    ticketboard::cli::handlers::handle_migrate(ctx)
}

#[cfg(not(feature = "postgres"))]
fn dispatch_migrate(_: &HandlerContext) -> Result<()> {
    Err(TicketboardError::Config(
        "this build has no PostgreSQL support; enable the `postgres` feature".into(),
    ))
}

/// Print the error, its suggestions and, with `--json`, a JSON error record
fn handle_error(error: &TicketboardError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() && !formatter.is_json() {
        eprintln!("\nSuggestions:");
        for suggestion in &suggestions {
            eprintln!("  • {suggestion}");
        }
    }

    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "code": error.code(),
            "error": error.to_string(),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
