//! # jscompress - Main Entry Point
//!
//! Command line driver meant to be called from a build step.
//!
//! ## Execution flow:
//! 1. Parse CLI arguments with `clap`
//! 2. Set up `tracing` logging on stderr (INFO, DEBUG with --verbose, or RUST_LOG)
//! 3. Load the optional JSON config file, then apply CLI overrides
//! 4. Resolve the Closure Compiler and run the orchestrator
//! 5. Exit non-zero if any file failed, unless --keep-going
//!
//! ## Example:
//! ```bash
//! jscompress src/main/resources --externs externs/jquery.js --workers 4 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use js_compress::compiler::{ClosureCompiler, CompilationLevel, CompilerSettings, LanguageMode, WarningLevel};
use js_compress::json_output::JsonMessage;
use js_compress::{Orchestrator, RunConfig, RunResult};

#[derive(Parser)]
#[command(name = "jscompress", version)]
#[command(about = "Minify JavaScript files whose minified output is missing or out of date")]
struct Args {
    /// Directory containing the JS sources
    source_directory: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only process the top level of the source directory
    #[arg(long)]
    no_recursive: bool,

    /// Encoding of the source files
    #[arg(short, long)]
    encoding: Option<String>,

    /// Suffix of the minified files
    #[arg(short, long)]
    target_suffix: Option<String>,

    /// Recompress even if the minified file is up to date
    #[arg(short, long)]
    force: bool,

    /// Extern declaration file (repeatable)
    #[arg(long = "externs", value_name = "FILE")]
    externs: Vec<PathBuf>,

    /// Number of concurrent compressions
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-file timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Closure Compiler executable
    #[arg(long)]
    compiler: Option<PathBuf>,

    /// Closure Compiler jar, run with java -jar
    #[arg(long)]
    compiler_jar: Option<PathBuf>,

    /// Java launcher used with --compiler-jar
    #[arg(long)]
    java: Option<PathBuf>,

    /// WHITESPACE_ONLY, SIMPLE_OPTIMIZATIONS or ADVANCED_OPTIMIZATIONS
    #[arg(long)]
    compilation_level: Option<CompilationLevel>,

    /// Input language, e.g. ECMASCRIPT5 or ECMASCRIPT6_STRICT
    #[arg(long)]
    language_in: Option<LanguageMode>,

    /// Output language; defaults to the input language
    #[arg(long)]
    language_out: Option<LanguageMode>,

    /// QUIET, DEFAULT or VERBOSE
    #[arg(long)]
    warning_level: Option<WarningLevel>,

    /// Compile in debug mode
    #[arg(long)]
    debug: bool,

    /// Generate exports for @export annotations
    #[arg(long)]
    generate_exports: bool,

    /// Emit newline-delimited JSON events on stdout
    #[arg(long)]
    json: bool,

    /// Exit successfully even if some files failed
    #[arg(long)]
    keep_going: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (config, settings) = load_configuration(&args).await?;
    let json_output = config.json_output;

    let result = match run(config, settings).await {
        Ok(result) => result,
        Err(e) => {
            if json_output {
                JsonMessage::error(format!("{:#}", e)).emit();
            }
            return Err(e);
        }
    };

    if result.has_failures() && !args.keep_going {
        return Err(anyhow::anyhow!(
            "{} of {} JS files failed to compress",
            result.failed,
            result.attempted
        ));
    }

    Ok(())
}

async fn run(config: RunConfig, settings: CompilerSettings) -> Result<RunResult> {
    let compiler = ClosureCompiler::new(settings)?;
    let orchestrator = Orchestrator::new(config, Arc::new(compiler));
    Ok(orchestrator.run().await?)
}

/// Config file values first, CLI flags on top
async fn load_configuration(args: &Args) -> Result<(RunConfig, CompilerSettings)> {
    let (mut config, mut settings) = match args.config {
        Some(ref path) => (RunConfig::from_file(path).await?, CompilerSettings::from_file(path).await?),
        None => (RunConfig::default(), CompilerSettings::default()),
    };

    if let Some(ref dir) = args.source_directory {
        config.root_dir = dir.clone();
    }
    if args.no_recursive {
        config.recursive = false;
    }
    if let Some(ref encoding) = args.encoding {
        config.source_encoding = encoding.clone();
    }
    if let Some(ref suffix) = args.target_suffix {
        config.target_suffix = suffix.clone();
    }
    if args.force {
        config.force = true;
    }
    config.externs.extend(args.externs.iter().cloned());
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.timeout.is_some() {
        config.timeout_secs = args.timeout;
    }
    if args.json {
        config.json_output = true;
    }

    if args.compiler.is_some() {
        settings.compiler = args.compiler.clone();
    }
    if args.compiler_jar.is_some() {
        settings.compiler_jar = args.compiler_jar.clone();
    }
    if let Some(ref java) = args.java {
        settings.java = java.clone();
    }
    if let Some(level) = args.compilation_level {
        settings.compilation_level = level;
    }
    if let Some(language) = args.language_in {
        settings.language_in = language;
        settings.language_out = args.language_out.unwrap_or(language);
    } else if let Some(language) = args.language_out {
        settings.language_out = language;
    }
    if let Some(level) = args.warning_level {
        settings.warning_level = level;
    }
    settings.debug |= args.debug;
    settings.generate_exports |= args.generate_exports;

    // File values and CLI overrides are validated together
    config.validate()?;
    Ok((config, settings))
}
