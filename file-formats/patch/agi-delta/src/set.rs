//! Patches for whole game directories
//!
//! A patch set pairs every file of a modified tree with the file at the
//! same relative path in the original tree and keeps a [`PatchFile`] for
//! each pair that differs. On disk a set is a directory mirroring the game
//! layout, holding one `<name>.agip` file per changed file.
//!
//! Both directions write through temporary files: every output is staged
//! next to its target first and only renamed into place once all of them
//! were written, so the output directory may be the game directory itself.

use rayon::prelude::*;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::diff::DiffOptions;
use crate::format::PatchFile;
use crate::{Error, Result};

/// Extension of serialized patches
pub const PATCH_EXTENSION: &str = "agip";

/// A patch and the relative path of the file it rewrites
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSetEntry {
    /// Path relative to the game directory
    pub path: PathBuf,
    /// Patch for that file
    pub patch: PatchFile,
}

/// Patches for every changed file of a game
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    entries: Vec<PatchSetEntry>,
    unchanged: Vec<PathBuf>,
    unmatched: Vec<PathBuf>,
}

impl PatchSet {
    /// Diff two directory trees with default options
    pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(original_dir: P, modified_dir: Q) -> Result<Self> {
        Self::build_with(original_dir, modified_dir, &DiffOptions::default())
    }

    /// Diff every file of `modified_dir` against its counterpart in
    /// `original_dir`. Files are diffed in parallel; identical files and
    /// files without a counterpart are listed but get no patch.
    pub fn build_with<P: AsRef<Path>, Q: AsRef<Path>>(
        original_dir: P,
        modified_dir: Q,
        options: &DiffOptions,
    ) -> Result<Self> {
        let original_dir = original_dir.as_ref();
        let modified_dir = modified_dir.as_ref();
        let files = relative_files(modified_dir)?;
        log::debug!(
            "Diffing {} files of {} against {}",
            files.len(),
            modified_dir.display(),
            original_dir.display()
        );

        let outcomes = files
            .into_par_iter()
            .map(|path| -> Result<Outcome> {
                let original_path = original_dir.join(&path);
                if !original_path.is_file() {
                    return Ok(Outcome::Unmatched(path));
                }
                let original = std::fs::read(&original_path)?;
                let modified = std::fs::read(modified_dir.join(&path))?;
                if original == modified {
                    return Ok(Outcome::Unchanged(path));
                }
                let patch = PatchFile::create(&original, &modified, options)?;
                log::debug!(
                    "{}: {} instructions, {} literal bytes",
                    path.display(),
                    patch.record.len(),
                    patch.record.inserted_len()
                );
                Ok(Outcome::Patched(PatchSetEntry { path, patch }))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut set = Self::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Patched(entry) => set.entries.push(entry),
                Outcome::Unchanged(path) => set.unchanged.push(path),
                Outcome::Unmatched(path) => {
                    log::warn!("{} has no original counterpart, skipped", path.display());
                    set.unmatched.push(path);
                }
            }
        }
        Ok(set)
    }

    /// Load every `.agip` file below `dir`
    pub fn read_from<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut set = Self::default();
        for relative in relative_files(dir)? {
            if relative.extension().is_none_or(|ext| ext != PATCH_EXTENSION) {
                continue;
            }
            let patch = PatchFile::parse(&std::fs::read(dir.join(&relative))?)?;
            set.entries.push(PatchSetEntry {
                path: relative.with_extension(""),
                patch,
            });
        }
        log::debug!("Read {} patches from {}", set.entries.len(), dir.display());
        Ok(set)
    }

    /// Write one `<name>.agip` per entry below `dir`, returning the paths
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let files = self
            .entries
            .iter()
            .map(|entry| Ok((dir.join(patch_name(&entry.path)), entry.patch.to_bytes()?)))
            .collect::<Result<Vec<_>>>()?;
        commit_all(files)
    }

    /// Apply every patch to the files of `original_dir`, writing the
    /// results below `output_dir`. All patches are checked and all outputs
    /// staged before any file is replaced.
    pub fn apply_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        original_dir: P,
        output_dir: Q,
    ) -> Result<Vec<PathBuf>> {
        let original_dir = original_dir.as_ref();
        let output_dir = output_dir.as_ref();

        let outputs = self
            .entries
            .par_iter()
            .map(|entry| -> Result<(PathBuf, Vec<u8>)> {
                let original = std::fs::read(original_dir.join(&entry.path))?;
                let output = entry.patch.apply(&original).map_err(|e| match e {
                    Error::PatchMismatch(msg) => {
                        Error::mismatch(format!("{}: {msg}", entry.path.display()))
                    }
                    other => other,
                })?;
                Ok((output_dir.join(&entry.path), output))
            })
            .collect::<Result<Vec<_>>>()?;

        commit_all(outputs)
    }

    /// Patched files in path order
    pub fn entries(&self) -> &[PatchSetEntry] {
        &self.entries
    }

    /// Number of patches
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no file changed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files identical in both trees
    pub fn unchanged(&self) -> &[PathBuf] {
        &self.unchanged
    }

    /// Modified files with no original to diff against
    pub fn unmatched(&self) -> &[PathBuf] {
        &self.unmatched
    }
}

enum Outcome {
    Patched(PatchSetEntry),
    Unchanged(PathBuf),
    Unmatched(PathBuf),
}

/// Stage every file in a temporary file beside its target, then rename
/// them all into place. A failure while staging leaves every target as it
/// was.
fn commit_all(files: Vec<(PathBuf, Vec<u8>)>) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(files.len());
    for (target, data) in files {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut temp_file = NamedTempFile::new_in(&dir)?;
        temp_file.write_all(&data)?;
        temp_file.as_file().sync_all()?;
        staged.push((temp_file, target));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (temp_file, target) in staged {
        temp_file.persist(&target).map_err(|e| Error::Io(e.error))?;
        log::trace!("Wrote {}", target.display());
        written.push(target);
    }
    Ok(written)
}

fn patch_name(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(PATCH_EXTENSION);
    PathBuf::from(name)
}

/// Regular files below `root` as sorted relative paths
fn relative_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];
    while let Some(relative) = pending.pop() {
        for entry in std::fs::read_dir(root.join(&relative))? {
            let entry = entry?;
            let path = relative.join(entry.file_name());
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
