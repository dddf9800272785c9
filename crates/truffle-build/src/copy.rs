//! File copies with digest-based up-to-date checks
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of a copy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    /// Destination files that were written
    pub copied: Vec<PathBuf>,
    /// Destination files that already matched their source
    pub up_to_date: Vec<PathBuf>,
}

impl CopyReport {
    /// Whether nothing had to be written
    pub fn is_up_to_date(&self) -> bool {
        self.copied.is_empty()
    }

    /// Every destination file
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = self.copied.clone();
        files.extend(self.up_to_date.iter().cloned());
        files.sort();
        files
    }

    pub fn merge(&mut self, other: CopyReport) {
        self.copied.extend(other.copied);
        self.up_to_date.extend(other.up_to_date);
    }
}

/// SHA-256 of a file's content
pub fn file_digest(path: &Path) -> BuildResult<String> {
    let content = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Copy one file unless the destination already has the same content
pub fn copy_file(source: &Path, dest: &Path, report: &mut CopyReport) -> BuildResult<()> {
    if dest.is_file() && file_digest(dest)? == file_digest(source)? {
        report.up_to_date.push(dest.to_path_buf());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::copy(source, dest).map_err(|e| BuildError::io(source, e))?;
    report.copied.push(dest.to_path_buf());
    Ok(())
}

/// Copy files into one directory, keeping only their file names
pub fn copy_flat(files: &[PathBuf], dest_dir: &Path) -> BuildResult<CopyReport> {
    fs::create_dir_all(dest_dir).map_err(|e| BuildError::io(dest_dir, e))?;
    let mut report = CopyReport::default();
    for file in files {
        if file.is_dir() {
            report.merge(copy_tree(file, dest_dir)?);
            continue;
        }
        let name = file
            .file_name()
            .ok_or_else(|| BuildError::io(file, std::io::ErrorKind::InvalidInput.into()))?;
        copy_file(file, &dest_dir.join(name), &mut report)?;
    }
    Ok(report)
}

/// Copy the contents of `source_dir` below `dest_dir`, keeping relative paths
pub fn copy_tree(source_dir: &Path, dest_dir: &Path) -> BuildResult<CopyReport> {
    let mut report = CopyReport::default();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source_dir).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .unwrap_or(entry.path());
        copy_file(entry.path(), &dest_dir.join(relative), &mut report)?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_digest_is_stable() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.jar");
        fs::write(&file, b"content").unwrap();
        assert_eq!(file_digest(&file).unwrap(), file_digest(&file).unwrap());
        assert_eq!(file_digest(&file).unwrap().len(), 64);
    }

    #[test]
    fn test_copy_flat_is_up_to_date_on_rerun() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("repo/x");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("compiler.jar"), b"compiler").unwrap();
        fs::write(src.join("truffle.jar"), b"truffle").unwrap();
        let files = vec![src.join("compiler.jar"), src.join("truffle.jar")];
        let dest = temp.path().join("out");

        let first = copy_flat(&files, &dest).unwrap();
        assert_eq!(first.copied.len(), 2);

        let second = copy_flat(&files, &dest).unwrap();
        assert!(second.is_up_to_date());
        assert_eq!(second.up_to_date.len(), 2);

        fs::write(src.join("truffle.jar"), b"truffle 2").unwrap();
        let third = copy_flat(&files, &dest).unwrap();
        assert_eq!(third.copied, vec![dest.join("truffle.jar")]);
    }

    #[test]
    fn test_copy_tree_keeps_layout() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("component");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::write(src.join("bin/launcher"), b"#!/bin/sh").unwrap();
        fs::write(src.join("README"), b"hi").unwrap();

        let dest = temp.path().join("out");
        let report = copy_tree(&src, &dest).unwrap();
        assert_eq!(report.copied.len(), 2);
        assert!(dest.join("bin/launcher").is_file());
        assert!(dest.join("README").is_file());
    }
}
