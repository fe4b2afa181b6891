// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for rewindfs

use serde::{Deserialize, Serialize};

/// Canonical path key.
///
/// Normalized, absolute, `/`-separated, no trailing separator except for the
/// root itself. Two references to the same file always compare equal here,
/// which is what makes the "same path, same node" identity guarantee
/// enforceable at the registry level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Normalize an arbitrary path string into canonical form.
    ///
    /// Collapses repeated separators and `.` components and resolves `..`
    /// against already-seen components. Relative input is treated as rooted.
    pub fn new(raw: &str) -> Self {
        let mut parts: Vec<&str> = Vec::new();
        for comp in raw.split('/') {
            match comp {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        if parts.is_empty() {
            Self("/".to_string())
        } else {
            Self(format!("/{}", parts.join("/")))
        }
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self("/".to_string())),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Last path component. Empty only for the root.
    pub fn leaf(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self::new(&format!("/{}", name))
        } else {
            Self::new(&format!("{}/{}", self.0, name))
        }
    }
}

impl std::fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Index of a metadata node inside the registry arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a write chunk inside the chunk arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkId(pub u64);

impl ChunkId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque payload blob identifier handed out by the payload store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PayloadId(pub u64);

impl PayloadId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque handle identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

impl HandleId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// 3-bit access rights mask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rights(pub u8);

impl Rights {
    pub const READ: u8 = 4;
    pub const WRITE: u8 = 2;
    pub const EXECUTE: u8 = 1;

    pub const fn none() -> Self {
        Self(0)
    }

    pub const fn read_write() -> Self {
        Self(Self::READ | Self::WRITE)
    }

    pub const fn all() -> Self {
        Self(Self::READ | Self::WRITE | Self::EXECUTE)
    }

    pub fn allows(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn grant(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn revoke(&mut self, flag: u8) {
        self.0 &= !flag;
    }
}

impl Default for Rights {
    fn default() -> Self {
        Self::read_write()
    }
}

/// Rights class: who a mask applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightsClass {
    /// The program under analysis
    Subject,
    Owner,
    Group,
    Other,
}

/// Independent rights masks for the four classes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsSet {
    pub subject: Rights,
    pub owner: Rights,
    pub group: Rights,
    pub other: Rights,
}

impl RightsSet {
    pub fn get(&self, class: RightsClass) -> Rights {
        match class {
            RightsClass::Subject => self.subject,
            RightsClass::Owner => self.owner,
            RightsClass::Group => self.group,
            RightsClass::Other => self.other,
        }
    }

    pub fn get_mut(&mut self, class: RightsClass) -> &mut Rights {
        match class {
            RightsClass::Subject => &mut self.subject,
            RightsClass::Owner => &mut self.owner,
            RightsClass::Group => &mut self.group,
            RightsClass::Other => &mut self.other,
        }
    }
}

/// File open options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
}

impl OpenMode {
    pub const READ_ONLY: OpenMode = OpenMode {
        read: true,
        write: false,
    };
    pub const READ_WRITE: OpenMode = OpenMode {
        read: true,
        write: true,
    };

    /// Parse a mode string. `"rws"` and `"rwd"` are accepted and behave as
    /// `"rw"` because sync is a no-op for in-memory content.
    pub fn parse(mode: &str) -> crate::error::FsResult<Self> {
        match mode {
            "r" => Ok(Self::READ_ONLY),
            "rw" | "rws" | "rwd" => Ok(Self::READ_WRITE),
            other => Err(crate::error::FsError::BadMode(other.to_string())),
        }
    }
}

impl std::str::FromStr for OpenMode {
    type Err = crate::error::FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Model statistics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FsStats {
    pub nodes: u64,
    pub live_nodes: u64,
    pub chunks: u64,
    pub chunk_bytes: u64,
    pub open_handles: u64,
}
