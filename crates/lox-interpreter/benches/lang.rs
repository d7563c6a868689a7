use std::fs;
use std::io;
use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion};
use lox_interpreter::Interpreter;

pub fn lang(c: &mut Criterion) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("res/benchmarks");
    let mut paths = fs::read_dir(&dir)
        .expect("could not read benchmark directory")
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()
        .expect("could not list benchmarks");
    paths.sort();

    for path in paths {
        let source = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("could not read benchmark: {}", path.display()));
        let name = path.file_stem().and_then(|name| name.to_str()).unwrap_or("benchmark");
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut interpreter = Interpreter::new(io::sink());
                interpreter.run(&source).expect("benchmark failed to run");
            })
        });
    }
}

criterion_group!(benches, lang);
criterion_main!(benches);
