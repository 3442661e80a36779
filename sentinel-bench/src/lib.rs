//! Synthetic subsystem fixtures shared by the `ingest` and `impact`
//! benchmarks: a call shape that actually stresses this crate's hot paths,
//! with one "hub" function called from every other function, plus a chain
//! long enough to exercise bounded-depth traversal.

use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureSize {
    Small,
    Medium,
    Large,
}

impl FixtureSize {
    pub fn file_count(&self) -> usize {
        match self {
            Self::Small => 10,
            Self::Medium => 100,
            Self::Large => 1_000,
        }
    }
}

pub struct Fixture {
    pub root: PathBuf,
    pub file_count: usize,
    pub function_count: usize,
}

/// Writes `size.file_count()` `.c` files under `dir`, each with a short
/// chain of functions that call into the next file's chain, plus every
/// file's last function calling a single shared `hub` function — so
/// `hub`'s caller count scales with fixture size.
pub fn generate_fixture(dir: &Path, size: FixtureSize) -> Fixture {
    let file_count = size.file_count();
    let funcs_per_file = 4;

    let hub_path = dir.join("hub.c");
    std::fs::write(&hub_path, "int hub(int x) { return x + 1; }\n").unwrap();

    for file_index in 0..file_count {
        let path = dir.join(format!("unit_{file_index}.c"));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "int hub(int x);").unwrap();
        for func_index in 0..funcs_per_file {
            let name = format!("u{file_index}_f{func_index}");
            if func_index + 1 < funcs_per_file {
                let next = format!("u{file_index}_f{}", func_index + 1);
                writeln!(file, "int {name}(int x) {{ return {next}(x) + 1; }}").unwrap();
            } else {
                writeln!(file, "int {name}(int x) {{ return hub(x) + 1; }}").unwrap();
            }
        }
        writeln!(file, "int sys_entry_{file_index}(int x) {{ return u{file_index}_f0(x); }}").unwrap();
    }

    Fixture {
        root: dir.to_path_buf(),
        file_count: file_count + 1,
        function_count: file_count * (funcs_per_file + 1) + 1,
    }
}
