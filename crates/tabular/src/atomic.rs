//! All-or-nothing file publication
//!
//! Files are first written to temporaries in their destination directory and
//! only renamed into place by [`AtomicWriter::commit`]. Dropping the writer
//! before commit deletes the temporaries and leaves destinations untouched.
//! If a rename fails partway through a commit, files already published are
//! put back: replaced destinations get their previous contents and new ones
//! are removed.

use crate::error::TableError;
use crate::table::Table;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

/// Stages files and publishes them together
#[derive(Default)]
pub struct AtomicWriter {
    /// Fully written temporaries and their final destinations
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl AtomicWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a table as CSV for `dest`
    pub fn stage_table(&mut self, table: &Table, dest: &Path) -> Result<(), TableError> {
        let mut tmp = temp_beside(dest)?;
        table
            .write_to(tmp.as_file_mut())
            .map_err(|source| TableError::Csv {
                path: dest.to_path_buf(),
                source,
            })?;
        self.finish(tmp, dest)
    }

    /// Stage raw bytes for `dest`
    pub fn stage_bytes(&mut self, bytes: &[u8], dest: &Path) -> Result<(), TableError> {
        let mut tmp = temp_beside(dest)?;
        tmp.write_all(bytes).map_err(|source| io_err(dest, source))?;
        self.finish(tmp, dest)
    }

    /// Number of staged files
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Rename every staged file into place, in staging order
    pub fn commit(self) -> Result<Vec<PathBuf>, TableError> {
        let mut published = Vec::with_capacity(self.staged.len());
        for (tmp, dest) in self.staged {
            match publish(tmp, &dest) {
                Ok(previous) => {
                    debug!("Published {}", dest.display());
                    published.push(Published { dest, previous });
                }
                Err(e) => {
                    rollback(published);
                    return Err(e);
                }
            }
        }
        Ok(published.into_iter().map(|p| p.dest).collect())
    }

    fn finish(&mut self, tmp: NamedTempFile, dest: &Path) -> Result<(), TableError> {
        tmp.as_file().sync_all().map_err(|source| io_err(dest, source))?;
        self.staged.push((tmp, dest.to_path_buf()));
        Ok(())
    }
}

/// A destination written during a commit and what it replaced
struct Published {
    dest: PathBuf,
    previous: Option<TempPath>,
}

/// Move any existing file aside, then rename `tmp` onto `dest`
fn publish(tmp: NamedTempFile, dest: &Path) -> Result<Option<TempPath>, TableError> {
    let previous = if dest.is_file() {
        let backup = temp_beside(dest)?.into_temp_path();
        std::fs::rename(dest, &backup).map_err(|source| io_err(dest, source))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = tmp.persist(dest) {
        if let Some(backup) = previous {
            restore(backup, dest);
        }
        return Err(io_err(dest, e.error));
    }
    Ok(previous)
}

fn rollback(published: Vec<Published>) {
    for Published { dest, previous } in published.into_iter().rev() {
        match previous {
            Some(backup) => restore(backup, &dest),
            None => match std::fs::remove_file(&dest) {
                Ok(()) => debug!("Removed {}", dest.display()),
                Err(e) => warn!("Could not remove {}: {}", dest.display(), e),
            },
        }
    }
}

fn restore(backup: TempPath, dest: &Path) {
    match backup.persist(dest) {
        Ok(()) => debug!("Restored {}", dest.display()),
        Err(e) => warn!("Could not restore {}: {}", dest.display(), e.error),
    }
}

fn temp_beside(dest: &Path) -> Result<NamedTempFile, TableError> {
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| io_err(&dir, source))?;
    NamedTempFile::new_in(&dir).map_err(|source| io_err(&dir, source))
}

fn io_err(path: &Path, source: std::io::Error) -> TableError {
    TableError::Io {
        path: path.to_path_buf(),
        source,
    }
}
