use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use lox_common::error::{report_errors, ErrorS};
use lox_interpreter::Interpreter;
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Syntax or static error in the input.
const EXIT_DATAERR: u8 = 65;
/// Error while running the program.
pub const EXIT_SOFTWARE: u8 = 70;
/// Input file could not be read.
pub const EXIT_IOERR: u8 = 74;

const DEBUG_FILTER: &str = "lox=trace,lox_syntax=debug,lox_interpreter=trace";

#[derive(Debug, Parser)]
#[command(about, author, disable_help_subcommand = true, propagate_version = true, version)]
pub enum Cmd {
    /// Start an interactive session.
    #[cfg(feature = "repl")]
    Repl {
        /// Trace parsing, resolution and evaluation to stderr.
        #[arg(long)]
        debug: bool,
    },
    /// Run a Lox script.
    Run {
        path: PathBuf,
        /// Trace parsing, resolution and evaluation to stderr.
        #[arg(long)]
        debug: bool,
        /// Print the parsed program before running it.
        #[arg(long)]
        ast: bool,
    },
}

impl Cmd {
    pub fn run(&self) -> Result<ExitCode> {
        match self {
            #[cfg(feature = "repl")]
            Cmd::Repl { debug } => {
                init_tracing(*debug);
                repl()
            }
            Cmd::Run { path, debug, ast } => {
                init_tracing(*debug);
                run(path, *ast)
            }
        }
    }
}

/// Logs are off unless `RUST_LOG` is set or `--debug` is passed. They go to
/// stderr so they never mix with program output.
fn init_tracing(debug: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if debug => EnvFilter::new(DEBUG_FILTER),
        Err(_) => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run(path: &Path, ast: bool) -> Result<ExitCode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read file: {}", path.display()))?;
    let name = path.display().to_string();
    tracing::debug!(path = %name, bytes = source.len(), "running script");

    let mut interpreter = Interpreter::new(io::stdout());

    let program = match interpreter.parse(&source) {
        Ok(program) => program,
        Err(errors) => return Ok(report(&name, &source, &errors, EXIT_DATAERR)),
    };
    if ast {
        let mut stdout = io::stdout();
        stdout.write_all(lox_syntax::printer::print(&program).as_bytes())?;
        stdout.flush()?;
    }
    if let Err(errors) = interpreter.resolve(&program) {
        return Ok(report(&name, &source, &errors, EXIT_DATAERR));
    }
    if let Err(error) = interpreter.interpret(&program) {
        return Ok(report(&name, &source, &[error], EXIT_SOFTWARE));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "repl")]
fn repl() -> Result<ExitCode> {
    use lox_repl::Signal;

    let mut editor = lox_repl::editor()?;
    let mut interpreter = Interpreter::new(io::stdout());

    loop {
        match editor.read_line(&lox_repl::Prompt) {
            Ok(Signal::Success(line)) => {
                if let Err(errors) = interpreter.run(&line) {
                    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                    report_errors(&mut stderr, "<stdin>", &line, &errors);
                }
            }
            Ok(Signal::CtrlC) => eprintln!("CTRL-C"),
            Ok(Signal::CtrlD) => break,
            Err(e) => {
                eprintln!("error: {e:?}");
                break;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report(name: &str, source: &str, errors: &[ErrorS], code: u8) -> ExitCode {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    report_errors(&mut stderr, name, source, errors);
    ExitCode::from(code)
}
