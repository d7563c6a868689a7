use std::io::Write;
use std::path::Path;
use std::{fs, str, thread};

use lox_interpreter::Interpreter;
use pretty_assertions::assert_eq;
use test_generator::test_resources;

// Resource paths are relative to the workspace root; tests run from the crate.
#[test_resources("crates/lox-interpreter/res/examples/**/*.lox")]
fn lox(path: &str) {
    let source = fs::read_to_string(Path::new("../..").join(path))
        .unwrap_or_else(|_| panic!("could not read test file: {path}"));

    let mut exp_output = String::new();
    for line in source.lines() {
        const OUT_COMMENT: &str = "// out: ";
        if let Some(idx) = line.find(OUT_COMMENT) {
            exp_output += &line[idx + OUT_COMMENT.len()..];
            exp_output += "\n";
        }
    }

    // Deep recursion tests need more room than the default test thread.
    let got_output = thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(move || {
            let mut got_output = Vec::new();
            let result = Interpreter::new(&mut got_output).run(&source);
            if let Err(errors) = result {
                for (e, _) in errors {
                    writeln!(&mut got_output, "{e}").expect("could not write to output");
                }
            }
            got_output
        })
        .expect("could not spawn interpreter thread")
        .join()
        .expect("interpreter thread panicked");

    let got_output = str::from_utf8(&got_output).expect("invalid UTF-8 in output");
    assert_eq!(exp_output, got_output);
}
