//! The typeloom command-line tool.
//!
//! - `loomc lsp` - Start the LSP server (communicates via stdin/stdout)
//! - `loomc check <file>` - Print syntax and type errors
//! - `loomc hint <file> --line L --character C` - Print the type at a position
//!
//! Logs go to stderr, filtered by `LOOM_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use loom_common::position::Position;
use loom_hints::{ConfigOverrides, Engine, EngineConfig, HintResponse};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loomc", version, about = "Type hints for loom documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct EngineArgs {
    /// Maximum inference steps per document
    #[arg(long)]
    budget: Option<u64>,

    /// Time limit for one hint request, in milliseconds
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,
}

impl EngineArgs {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            inference_budget: self.budget,
            request_timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the LSP server (communicates via stdin/stdout)
    Lsp {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Report syntax and type errors in a file
    Check {
        file: PathBuf,

        /// Output diagnostics as JSON (one object per line)
        #[arg(long)]
        json: bool,
    },
    /// Print the type hint at a position (zero-based line and character)
    Hint {
        file: PathBuf,

        #[arg(long)]
        line: u32,

        #[arg(long)]
        character: u32,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lsp { engine } => {
            runtime().map(|rt| rt.block_on(loom_lsp::run_server(engine.overrides())))
        }
        Commands::Check { file, json } => check(&file, json),
        Commands::Hint {
            file,
            line,
            character,
            json,
            engine,
        } => hint(&file, Position::new(line, character), json, engine.overrides()),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("LOOM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("failed to start the async runtime: {}", e))
}

fn read(file: &Path) -> Result<String, String> {
    std::fs::read_to_string(file).map_err(|e| format!("failed to read '{}': {}", file.display(), e))
}

/// Parse and type-check `file`, printing every error. Fails when any exist.
fn check(file: &Path, json: bool) -> Result<(), String> {
    let source = read(file)?;
    let parse = loom_parser::parse(&source);
    let typeck = loom_typeck::check(&parse);
    let count = parse.errors().len() + typeck.errors.len();

    if json {
        let engine = Engine::default();
        let uri = file.display().to_string();
        engine.open(&uri, source, 0);
        let diagnostics = runtime()?
            .block_on(engine.diagnostics(&uri))
            .map_err(|e| e.to_string())?;
        for diagnostic in diagnostics {
            let line = serde_json::to_string(&diagnostic).map_err(|e| e.to_string())?;
            eprintln!("{}", line);
        }
    } else {
        for error in parse.errors() {
            eprint!("{}", loom_typeck::diagnostics::render_parse_error(error, &source));
        }
        for error in &typeck.errors {
            eprint!("{}", loom_typeck::diagnostics::render_diagnostic(error, &source));
        }
    }

    if count > 0 {
        return Err(format!("{}: {} error(s)", file.display(), count));
    }
    println!("{}: ok", file.display());
    Ok(())
}

fn hint(
    file: &Path,
    position: Position,
    json: bool,
    overrides: ConfigOverrides,
) -> Result<(), String> {
    let source = read(file)?;
    let engine = Engine::new(overrides.apply(EngineConfig::default()));
    let uri = file.display().to_string();
    engine.open(&uri, source, 0);

    let response = runtime()?
        .block_on(engine.get_type_hints(&uri, position))
        .map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }
    match response {
        HintResponse::Available(hint) => {
            println!("{}", hint.ty);
            Ok(())
        }
        HintResponse::Unavailable { reason } => Err(format!("no hint: {:?}", reason)),
    }
}
