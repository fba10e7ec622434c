//! File system utilities.

use crate::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into when scanning.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "target",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
];

/// Extensions treated as binary and never scanned.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "gz", "tar", "so", "dll", "exe", "bin",
    "pyc", "class", "jar", "wasm", "rlib",
];

/// Files larger than this are skipped.
pub const MAX_TEXT_FILE_BYTES: u64 = 1024 * 1024;

/// Check if a path exists and is a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(crate::Error::PathNotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(crate::Error::NotADirectory(path.display().to_string()));
    }
    Ok(())
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file looks like a binary format based on extension.
pub fn is_binary_file(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Collect candidate text files below `root`, sorted by path.
///
/// Skips build and VCS directories, binary extensions and large files.
pub fn collect_text_files(root: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(root)?;

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.depth() > 0
                && e.file_name()
                    .to_str()
                    .map(|name| SKIPPED_DIRS.contains(&name))
                    .unwrap_or(false))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !is_binary_file(e.path()))
        .filter(|e| {
            e.metadata()
                .map(|m| m.len() <= MAX_TEXT_FILE_BYTES)
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    tracing::debug!("Collected {} text files under {:?}", files.len(), root);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_binary_file() {
        assert!(is_binary_file(Path::new("logo.PNG")));
        assert!(!is_binary_file(Path::new("main.rs")));
        assert!(!is_binary_file(Path::new("Makefile")));
    }

    #[test]
    fn test_collect_text_files_skips_noise() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();
        fs::write(root.join("logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join(".git/config"), "[core]").unwrap();
        fs::write(root.join("target/debug/out.txt"), "x").unwrap();

        let files = collect_text_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["README.md", "src/main.rs"]);
    }

    #[test]
    fn test_ensure_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            ensure_directory(&file),
            Err(crate::Error::NotADirectory(_))
        ));
        assert!(matches!(
            ensure_directory(&temp_dir.path().join("missing")),
            Err(crate::Error::PathNotFound(_))
        ));
    }
}
