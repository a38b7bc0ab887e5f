//! Sharded line reading
//!
//! Extract files run to millions of lines. `ShardReader` streams them
//! in fixed-size shards so map tasks can be scheduled while the rest of
//! the input is still on disk.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::{ParserError, Result};

/// Iterator over fixed-size shards of lines from one or more files
pub struct ShardReader {
    /// Files still to be opened
    pending: std::vec::IntoIter<PathBuf>,
    /// File currently being read
    current: Option<(PathBuf, BufReader<File>)>,
    /// Lines per shard
    shard_size: usize,
    /// Lines handed out so far
    lines_read: u64,
}

impl ShardReader {
    /// Open a reader over the given files, read in order.
    ///
    /// Every path is checked up front so a typo fails before any work starts.
    pub fn open<P: AsRef<Path>>(paths: &[P], shard_size: usize) -> Result<Self> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(ParserError::FileNotFound(missing.clone()));
        }

        Ok(Self {
            pending: paths.into_iter(),
            current: None,
            shard_size: shard_size.max(1),
            lines_read: 0,
        })
    }

    /// Total lines handed out so far
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    fn next_file(&mut self) -> Result<bool> {
        match self.pending.next() {
            Some(path) => {
                let file = File::open(&path).map_err(|e| ParserError::IoError {
                    path: path.clone(),
                    source: e,
                })?;
                tracing::debug!("Reading {}", path.display());
                self.current = Some((path, BufReader::new(file)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn fill_shard(&mut self) -> Result<Vec<String>> {
        let mut shard = Vec::with_capacity(self.shard_size);
        let mut buf = Vec::new();

        while shard.len() < self.shard_size {
            let Some((path, reader)) = self.current.as_mut() else {
                if self.next_file()? {
                    continue;
                }
                break;
            };

            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| ParserError::IoError {
                    path: path.clone(),
                    source: e,
                })?;

            if n == 0 {
                self.current = None;
                continue;
            }

            // Extracts are UTF-8; a stray byte must not abort a multi-hour run
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                shard.push(line.to_string());
            }
        }

        self.lines_read += shard.len() as u64;
        Ok(shard)
    }
}

impl Iterator for ShardReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.fill_shard() {
            Ok(shard) if shard.is_empty() => None,
            Ok(shard) => Some(Ok(shard)),
            Err(e) => Some(Err(e)),
        }
    }
}
