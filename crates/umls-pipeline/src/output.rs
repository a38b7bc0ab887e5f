//! Tab-delimited artifact writer
//!
//! Artifacts are written to a `.partial` sibling and renamed into place,
//! so a reader never sees a half-written table and an aborted run leaves
//! the previous artifact intact.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use umls_core::{Result, UmlsError};

/// Write one line per record, replacing any existing file
pub fn write_table<T: Display>(path: impl AsRef<Path>, records: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let io_err = |source| UmlsError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let partial = partial_path(path);
    let file = File::create(&partial).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{record}").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    drop(writer);

    fs::rename(&partial, path).map_err(io_err)?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(records.len())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
