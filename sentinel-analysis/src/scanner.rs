//! Subsystem discovery beneath a kernel root: a subsystem is a rooted
//! directory below the configured kernel root, identified by its first
//! path segment. Limited to file counting — per-file hashing and
//! added/modified/removed diffing for incremental scans has no counterpart
//! here; incremental re-ingest works off `sentinel-parser`'s content hash
//! instead.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsystemInfo {
    pub name: String,
    pub root: PathBuf,
    pub file_count: usize,
    pub total_size_bytes: u64,
}

fn count_c_files(dir: &Path) -> (usize, u64) {
    WalkBuilder::new(dir)
        .hidden(true)
        .follow_links(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("c"))
        .fold((0usize, 0u64), |(count, bytes), entry| {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (count + 1, bytes + size)
        })
}

/// Every immediate subdirectory of `kernel_root` is a subsystem.
pub fn discover_subsystems(kernel_root: &Path) -> std::io::Result<Vec<SubsystemInfo>> {
    let mut subsystems = Vec::new();
    for entry in std::fs::read_dir(kernel_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let (file_count, total_size_bytes) = count_c_files(&entry.path());
        subsystems.push(SubsystemInfo {
            name,
            root: entry.path(),
            file_count,
            total_size_bytes,
        });
    }
    subsystems.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(subsystems)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_one_subsystem_per_top_level_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("net")).unwrap();
        std::fs::create_dir_all(dir.path().join("fs")).unwrap();
        std::fs::write(dir.path().join("net/a.c"), "int a(void) { return 0; }").unwrap();
        std::fs::write(dir.path().join("net/b.h"), "// header, not counted").unwrap();
        std::fs::write(dir.path().join("fs/c.c"), "int c(void) { return 1; }").unwrap();

        let subsystems = discover_subsystems(dir.path()).unwrap();
        assert_eq!(subsystems.len(), 2);
        let net = subsystems.iter().find(|s| s.name == "net").unwrap();
        assert_eq!(net.file_count, 1);
    }
}
