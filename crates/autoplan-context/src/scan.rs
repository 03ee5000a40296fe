//! Directory scanning for the tech-stack and file-group summaries.

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

/// Manifest/config filenames scanned for the tech-stack summary.
const KNOWN_MANIFESTS: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "Cargo.toml",
    "go.mod",
    "Dockerfile",
    "build.gradle",
    "pom.xml",
    "Makefile",
    "CMakeLists.txt",
];

/// Directories never descended into while scanning.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    ".git",
    "dist",
    "build",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
    ".autoplan",
];

const MANIFEST_SCAN_MAX_DEPTH: usize = 4;

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

/// Finds known manifest/config files under `project_path`, skipping
/// excluded directories, up to a shallow depth.
#[must_use]
pub fn find_manifests(project_path: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut found = Vec::new();
    let walker = WalkDir::new(project_path.as_std_path())
        .max_depth(MANIFEST_SCAN_MAX_DEPTH)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if KNOWN_MANIFESTS.contains(&name) {
                if let Ok(path) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) {
                    found.push(path);
                }
            }
        }
    }
    found.sort();
    found
}

/// Reads every manifest in `paths`, concatenating contents with a header
/// naming the source file. Unreadable files are skipped, not fatal.
#[must_use]
pub fn concatenate_manifests(paths: &[Utf8PathBuf]) -> String {
    let mut combined = String::new();
    for path in paths {
        if let Ok(content) = std::fs::read_to_string(path.as_std_path()) {
            combined.push_str(&format!("--- {path} ---\n"));
            combined.push_str(&content);
            combined.push('\n');
        }
    }
    combined
}

/// Collects up to `max_files` source files under `project_path`, excluding
/// known build/dependency directories, sorted lexicographically by
/// project-relative path for deterministic output.
#[must_use]
pub fn collect_source_files(project_path: &Utf8Path, max_files: usize) -> Vec<String> {
    let mut files = Vec::new();
    let walker = WalkDir::new(project_path.as_std_path())
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(project_path.as_std_path()) {
            if let Some(rel_str) = relative.to_str() {
                files.push(rel_str.replace('\\', "/"));
            }
        }
    }
    files.sort();
    files.truncate(max_files);
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn finds_known_manifests_and_skips_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules").join("package.json"), "{}").unwrap();

        let manifests = find_manifests(&root);
        assert_eq!(manifests.len(), 1);
        assert!(manifests[0].as_str().ends_with("Cargo.toml"));
    }

    #[test]
    fn collect_source_files_is_sorted_and_capped() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        for name in ["c.rs", "a.rs", "b.rs"] {
            fs::write(root.join(name), "// file").unwrap();
        }

        let files = collect_source_files(&root, 2);
        assert_eq!(files, vec!["a.rs".to_string(), "b.rs".to_string()]);
    }

    #[test]
    fn concatenate_manifests_skips_unreadable_paths() {
        let missing = vec![Utf8PathBuf::from("/definitely/not/a/real/path.toml")];
        assert_eq!(concatenate_manifests(&missing), "");
    }
}
