// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Native-filesystem fallback source
//!
//! The base layer beneath all modeled writes. Only bytes never covered by a
//! write chunk are ever fetched from here, and nothing in a modeled run
//! writes back. The single exception is `write_range`, used for paths the
//! host configured as excluded from the model.

use std::path::{Path, PathBuf};

use crate::error::{FsError, FsResult};
use crate::types::CanonicalPath;

/// Read-only view of pre-existing native content.
#[cfg_attr(test, mockall::automock)]
pub trait NativeFs: Send + Sync {
    fn exists(&self, path: &CanonicalPath) -> bool;

    fn is_directory(&self, path: &CanonicalPath) -> bool;

    /// Length of a native file; `NotFound` if it does not exist.
    fn length(&self, path: &CanonicalPath) -> FsResult<u64>;

    /// Read up to `buf.len()` bytes at `offset`; short reads past EOF are
    /// truncated, returning the count actually copied.
    fn read_range(&self, path: &CanonicalPath, offset: u64, buf: &mut [u8]) -> FsResult<usize>;

    /// Child names of a native directory.
    fn list_names(&self, path: &CanonicalPath) -> FsResult<Vec<String>>;

    /// Write through to the native file. Only reachable for excluded paths;
    /// sources that cannot write simply keep the default.
    fn write_range(&self, _path: &CanonicalPath, _offset: u64, _data: &[u8]) -> FsResult<usize> {
        Err(FsError::Unsupported)
    }
}

/// Host filesystem implementation of `NativeFs`, rooted at a host directory.
pub struct HostNativeFs {
    root: PathBuf,
}

impl HostNativeFs {
    pub fn new(root: PathBuf) -> FsResult<Self> {
        let metadata = std::fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(Self { root })
    }

    fn host_path(&self, path: &CanonicalPath) -> PathBuf {
        let rel = path.as_str().trim_start_matches('/');
        self.root.join(Path::new(rel))
    }
}

impl NativeFs for HostNativeFs {
    fn exists(&self, path: &CanonicalPath) -> bool {
        self.host_path(path).exists()
    }

    fn is_directory(&self, path: &CanonicalPath) -> bool {
        self.host_path(path).is_dir()
    }

    fn length(&self, path: &CanonicalPath) -> FsResult<u64> {
        let metadata = std::fs::metadata(self.host_path(path))?;
        Ok(metadata.len())
    }

    fn read_range(&self, path: &CanonicalPath, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        use std::io::{Read, Seek};
        let mut file = std::fs::File::open(self.host_path(path))?;
        file.seek(std::io::SeekFrom::Start(offset))?;
        let mut total = 0;
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn list_names(&self, path: &CanonicalPath) -> FsResult<Vec<String>> {
        let entries = std::fs::read_dir(self.host_path(path))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn write_range(&self, path: &CanonicalPath, offset: u64, data: &[u8]) -> FsResult<usize> {
        use std::io::{Seek, Write};
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(self.host_path(path))?;
        file.seek(std::io::SeekFrom::Start(offset))?;
        let n = file.write(data)?;
        file.flush()?;
        Ok(n)
    }
}
