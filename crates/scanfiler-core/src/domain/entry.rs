//! Remote listing entries and the per-tenant known-file set
//!
//! A [`RemoteEntry`] is produced fresh by every listing call and never outlives
//! one poll cycle. A [`KnownSet`] is the only state carried between cycles: the
//! file names (and sizes) a tenant folder contained when it was last listed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kind of an entry in a remote directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file
    File,
    /// A directory
    Folder,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        };
        write!(f, "{}", s)
    }
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Entry name, without any directory component
    pub name: String,
    /// Whether the entry is a file or a folder
    pub kind: EntryKind,
    /// Size in bytes as reported by the server (0 for folders on most servers)
    pub size: u64,
}

impl RemoteEntry {
    /// Creates a file entry
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
        }
    }

    /// Creates a folder entry
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
            size: 0,
        }
    }

    /// Returns true if this entry is a regular file
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns true if this entry is a folder
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// File names last observed in one tenant folder, with their sizes
///
/// A `KnownSet` is never edited in place: it is rebuilt wholesale from a
/// listing with [`KnownSet::from_listing`] once a poll cycle is done with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownSet {
    files: HashMap<String, u64>,
}

impl KnownSet {
    /// Builds the set from a listing, keeping only file entries
    pub fn from_listing(entries: &[RemoteEntry]) -> Self {
        let files = entries
            .iter()
            .filter(|e| e.is_file())
            .map(|e| (e.name.clone(), e.size))
            .collect();
        Self { files }
    }

    /// Returns true if a file with this name was observed
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Returns the size recorded for a file name
    pub fn size_of(&self, name: &str) -> Option<u64> {
        self.files.get(name).copied()
    }

    /// Returns the file entries of `listing` whose names are not in this set
    ///
    /// Listing order is preserved. Folders are never returned. A known file is
    /// not returned even if its size changed.
    pub fn new_files<'a>(&self, listing: &'a [RemoteEntry]) -> Vec<&'a RemoteEntry> {
        listing
            .iter()
            .filter(|e| e.is_file() && !self.contains(&e.name))
            .collect()
    }

    /// Number of known files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file is known
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Known file names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
