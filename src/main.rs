mod cmd;

use std::process::ExitCode;
use std::thread;

use anyhow::Context;
use clap::Parser;

use crate::cmd::{Cmd, EXIT_IOERR, EXIT_SOFTWARE};

/// Lox calls recurse on the host stack, so give the interpreter enough room
/// to reach its own depth limit first.
const STACK_SIZE: usize = 64 * 1024 * 1024;

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cmd = Cmd::parse();
    let result = thread::Builder::new()
        .name("lox".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || cmd.run())
        .context("could not start interpreter thread");
    let result = match result {
        Ok(handle) => match handle.join() {
            Ok(result) => result,
            // The panic hook has already reported it.
            Err(_) => return ExitCode::from(EXIT_SOFTWARE),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::from(EXIT_IOERR)
        }
    }
}
