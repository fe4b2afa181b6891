// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Payload storage backends for rewindfs
//!
//! A payload is the byte image of one write chunk. Payloads are immutable
//! from the moment they are allocated; backtracking only ever moves chain
//! head pointers, so a blob written here is never touched again during a run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{FsError, FsResult};
use crate::types::PayloadId;

/// Storage backend trait for immutable chunk payloads
pub trait PayloadStore: Send + Sync {
    /// Store a private copy of `bytes`, returning its handle.
    fn allocate(&self, bytes: &[u8]) -> FsResult<PayloadId>;

    /// Read `buf.len()` bytes starting at `offset` within the payload.
    /// Reads past the payload end are truncated; returns the count copied.
    fn read(&self, id: PayloadId, offset: u64, buf: &mut [u8]) -> FsResult<usize>;

    /// Length of the payload in bytes.
    fn len(&self, id: PayloadId) -> FsResult<u64>;
}

/// In-memory payload store
pub struct InMemoryPayloads {
    next_id: Mutex<u64>,
    data: Mutex<HashMap<PayloadId, Vec<u8>>>,
}

impl InMemoryPayloads {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            data: Mutex::new(HashMap::new()),
        }
    }

    fn get_next_id(&self) -> PayloadId {
        let mut next_id = self.next_id.lock().unwrap();
        let id = PayloadId::new(*next_id);
        *next_id += 1;
        id
    }
}

impl PayloadStore for InMemoryPayloads {
    fn allocate(&self, bytes: &[u8]) -> FsResult<PayloadId> {
        let id = self.get_next_id();
        self.data.lock().unwrap().insert(id, bytes.to_vec());
        Ok(id)
    }

    fn read(&self, id: PayloadId, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        let data = self.data.lock().unwrap();
        let payload = data.get(&id).ok_or(FsError::NotFound)?;

        let start = offset as usize;
        if start >= payload.len() {
            return Ok(0);
        }
        let end = std::cmp::min(start + buf.len(), payload.len());
        let count = end - start;
        buf[..count].copy_from_slice(&payload[start..end]);
        Ok(count)
    }

    fn len(&self, id: PayloadId) -> FsResult<u64> {
        let data = self.data.lock().unwrap();
        let payload = data.get(&id).ok_or(FsError::NotFound)?;
        Ok(payload.len() as u64)
    }
}

impl Default for InMemoryPayloads {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-cache payload store backed by a directory on the native filesystem.
///
/// Each payload becomes one opaque blob file named by its generated id.
pub struct WriteCachePayloads {
    root: PathBuf,
    next_id: Mutex<u64>,
}

impl WriteCachePayloads {
    pub fn new(root: PathBuf) -> FsResult<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            next_id: Mutex::new(1),
        })
    }

    fn get_next_id(&self) -> PayloadId {
        let mut next_id = self.next_id.lock().unwrap();
        let id = PayloadId::new(*next_id);
        *next_id += 1;
        id
    }

    fn blob_path(&self, id: PayloadId) -> PathBuf {
        self.root.join(format!("{:016x}", id.0))
    }
}

impl PayloadStore for WriteCachePayloads {
    fn allocate(&self, bytes: &[u8]) -> FsResult<PayloadId> {
        let id = self.get_next_id();
        std::fs::write(self.blob_path(id), bytes)?;
        Ok(id)
    }

    fn read(&self, id: PayloadId, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        use std::io::{Read, Seek};
        let mut file = std::fs::File::open(self.blob_path(id))?;
        file.seek(std::io::SeekFrom::Start(offset))?;
        let mut total = 0;
        // A blob file is written in one shot, but short reads are still legal.
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn len(&self, id: PayloadId) -> FsResult<u64> {
        let meta = std::fs::metadata(self.blob_path(id))?;
        Ok(meta.len())
    }
}

/// Create a payload store from configuration.
pub fn create_payload_store(config: &crate::config::FsConfig) -> FsResult<Box<dyn PayloadStore>> {
    match &config.write_cache_dir {
        None => Ok(Box::new(InMemoryPayloads::new())),
        Some(dir) => Ok(Box::new(WriteCachePayloads::new(dir.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_allocate_and_read() {
        let store = InMemoryPayloads::new();
        let id = store.allocate(b"hello world").unwrap();
        assert_eq!(store.len(id).unwrap(), 11);

        let mut buf = [0u8; 5];
        let n = store.read(id, 6, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn in_memory_read_past_end() {
        let store = InMemoryPayloads::new();
        let id = store.allocate(b"short").unwrap();

        let mut buf = [0u8; 10];
        assert_eq!(store.read(id, 10, &mut buf).unwrap(), 0);
        assert_eq!(store.read(id, 3, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"rt");
    }

    #[test]
    fn write_cache_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = WriteCachePayloads::new(dir.path().to_path_buf()).unwrap();

        let a = store.allocate(b"first blob").unwrap();
        let b = store.allocate(b"second").unwrap();
        assert_ne!(a, b);

        let mut buf = [0u8; 4];
        let n = store.read(a, 6, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"blob");
        assert_eq!(store.len(b).unwrap(), 6);

        // One blob file per payload, named by id
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn missing_payload_is_not_found() {
        let store = InMemoryPayloads::new();
        let mut buf = [0u8; 1];
        assert!(matches!(
            store.read(PayloadId::new(99), 0, &mut buf),
            Err(FsError::NotFound)
        ));
    }
}
