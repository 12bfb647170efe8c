//! File replacement and batch helpers
//!
//! Containers are never edited in place on disk. [`replace_atomically`]
//! reads the original into memory, transforms it, writes the result to a
//! temporary file next to the original and renames it over the original
//! only when everything succeeded.

use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::Error;

/// Rewrite `path` through `transform`.
///
/// Returns `Ok(false)` without touching the file when the transform
/// produced identical bytes. On any error the original is left as it was.
pub fn replace_atomically<P, F, E>(path: P, transform: F) -> std::result::Result<bool, E>
where
    P: AsRef<Path>,
    F: FnOnce(&[u8]) -> std::result::Result<Vec<u8>, E>,
    E: From<Error>,
{
    let path = path.as_ref();
    let original = std::fs::read(path).map_err(|e| E::from(Error::Io(e)))?;
    let updated = transform(&original)?;
    if updated == original {
        log::debug!("{} unchanged", path.display());
        return Ok(false);
    }

    write_atomically(path, &updated).map_err(E::from)?;
    log::debug!(
        "Replaced {} ({} -> {} bytes)",
        path.display(),
        original.len(),
        updated.len()
    );
    Ok(true)
}

/// Write `data` to `path` through a temporary file in the same directory
pub fn write_atomically<P: AsRef<Path>>(path: P, data: &[u8]) -> crate::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(data)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Run independent per-file jobs on the rayon pool.
///
/// Every job runs to completion; results come back in input order so the
/// caller can report each failure before deciding to abort.
pub fn run_batch<T, R, E, F>(items: Vec<T>, job: F) -> Vec<std::result::Result<R, E>>
where
    T: Send,
    R: Send,
    E: Send,
    F: Fn(T) -> std::result::Result<R, E> + Sync + Send,
{
    log::debug!(
        "Running batch of {} jobs on {} threads",
        items.len(),
        rayon::current_num_threads()
    );
    items.into_par_iter().map(job).collect()
}
