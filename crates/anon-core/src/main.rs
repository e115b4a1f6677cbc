//! Anonymizing relay - command-line entry point.
//!
//! Subcommands:
//! - `serve`: run the HTTP relay
//! - `process`: one redact -> transform -> restore cycle over a file or stdin
//! - `redact`: redaction only, optionally printing the mapping
//! - `check`: validate configuration
//! - `version`

use anon_core::config::{load_config, ConfigOptions, ResolvedConfig};
use anon_core::exit_codes::ExitCode;
use anon_core::logging::{generate_request_id, init_logging, request_span, LogConfig, LogFormat, LogLevel};
use anon_core::runtime::Relay;
use anon_core::server::RelayServer;
use anon_config::CONFIG_SCHEMA_VERSION;
use anon_redact::RestoreMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reversible pseudonymization relay
#[derive(Parser)]
#[command(name = "anon-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to relay.json (overrides ANON_RELAY_CONFIG and XDG lookup)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Output format for command payloads
    #[arg(long, short = 'f', global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay
    Serve(ServeArgs),

    /// Run one full cycle over a file or stdin and print the restored text
    Process(ProcessArgs),

    /// Redact a file or stdin and print the placeholder text
    Redact(RedactArgs),

    /// Validate configuration
    Check,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address (overrides server.bind)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides server.port)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Worker threads (overrides server.workers)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    workers: Option<u16>,

    /// Do not send CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input file ("-" or omitted for stdin)
    input: Option<PathBuf>,

    /// Fail if any placeholder cannot be restored
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Input file ("-" or omitted for stdin)
    input: Option<PathBuf>,

    /// Also print the entity mapping (contains the raw values)
    #[arg(long)]
    show_mapping: bool,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet || cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet))
    } else {
        None
    };
    let log_config = LogConfig::from_env(cli_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Serve(args) => run_serve(&cli.global, args),
        Commands::Process(args) => run_process(&cli.global, args),
        Commands::Redact(args) => run_redact(&cli.global, args),
        Commands::Check => run_check(&cli.global),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Commands
// ============================================================================

fn run_serve(global: &GlobalOpts, args: &ServeArgs) -> ExitCode {
    let (resolved, relay) = match load_relay(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let mut server_config = resolved.relay.server.clone();
    if let Some(bind) = &args.bind {
        server_config.bind = bind.clone();
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }
    if let Some(workers) = args.workers {
        server_config.workers = workers as usize;
    }
    if args.no_cors {
        server_config.cors = false;
    }

    match RelayServer::start(&server_config, Arc::new(relay)) {
        Ok(server) => {
            eprintln!("anon-core listening on http://{}", server.addr());
            server.wait();
            ExitCode::Clean
        }
        Err(e) => report_error(global, ExitCode::IoError, &e),
    }
}

fn run_process(global: &GlobalOpts, args: &ProcessArgs) -> ExitCode {
    let text = match read_input(args.input.as_deref()) {
        Ok(t) => t,
        Err(e) => return report_error(global, ExitCode::InputError, &e),
    };
    let (_, relay) = match load_relay(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let relay = if args.strict {
        relay.with_restore_mode(RestoreMode::Strict)
    } else {
        relay
    };

    let span = request_span(&generate_request_id());
    let _enter = span.enter();

    let outcome = match relay.process(&text) {
        Ok(o) => o,
        Err(e) => return report_error(global, ExitCode::from_error(&e), &e.to_string()),
    };

    match global.format {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Text => print!("{}", outcome.text),
    }

    if outcome.unresolved.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::Unresolved
    }
}

fn run_redact(global: &GlobalOpts, args: &RedactArgs) -> ExitCode {
    let text = match read_input(args.input.as_deref()) {
        Ok(t) => t,
        Err(e) => return report_error(global, ExitCode::InputError, &e),
    };
    let (_, relay) = match load_relay(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let span = request_span(&generate_request_id());
    let _enter = span.enter();

    let redaction = match relay.redact(&text) {
        Ok(r) => r,
        Err(e) => return report_error(global, ExitCode::from_error(&e), &e.to_string()),
    };

    match global.format {
        OutputFormat::Json => {
            let mut output = serde_json::json!({
                "text": redaction.text,
                "spans_detected": redaction.spans_detected,
                "entities": redaction.store.counts(),
            });
            if args.show_mapping {
                output["mapping"] = serde_json::to_value(&redaction.store).unwrap_or_default();
            }
            print_json(&output);
        }
        OutputFormat::Text => {
            print!("{}", redaction.text);
            if args.show_mapping {
                if !redaction.text.ends_with('\n') {
                    println!();
                }
                print_json(&redaction.store);
            }
        }
    }

    ExitCode::Clean
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let (resolved, relay) = match load_relay(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let snapshot = resolved.snapshot();

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "ok",
            "config": snapshot,
        })),
        OutputFormat::Text => {
            println!("config: ok");
            match &snapshot.path {
                Some(path) => println!("source: {} ({})", path.display(), snapshot.source),
                None => {
                    println!("source: {}", snapshot.source);
                    for path in &snapshot.searched {
                        println!("  not found: {}", path.display());
                    }
                }
            }
            println!("transformer: {}", relay.transformer_name());
            println!("restore mode: {}", snapshot.restore_mode);
            println!("recognizers: {}", snapshot.recognizers.join(", "));
        }
    }

    ExitCode::Clean
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "anon_core_version": env!("CARGO_PKG_VERSION"),
            "config_schema_version": CONFIG_SCHEMA_VERSION,
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            "llm": cfg!(feature = "llm"),
        })),
        OutputFormat::Text => {
            println!("anon-core {}", env!("CARGO_PKG_VERSION"));
            println!("config schema version: {}", CONFIG_SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn load_relay(global: &GlobalOpts) -> Result<(ResolvedConfig, Relay), ExitCode> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
    };
    let resolved = load_config(&options)
        .map_err(|e| report_error(global, ExitCode::ConfigError, &e.to_string()))?;
    let relay = Relay::from_config(&resolved.relay)
        .map_err(|e| report_error(global, e.exit_code(), &e.to_string()))?;
    Ok((resolved, relay))
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .map_err(|e| format!("failed to read {}: {}", p.display(), e)),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

fn report_error(global: &GlobalOpts, code: ExitCode, message: &str) -> ExitCode {
    tracing::debug!(code = %code, "command failed");
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "error",
            "code": code.code_name(),
            "exit_code": code.as_i32(),
            "error": message,
        })),
        OutputFormat::Text => eprintln!("anon-core: {}", message),
    }
    code
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("anon-core: failed to serialize output: {}", e),
    }
}
