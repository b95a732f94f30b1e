//! Duplicate detection for stored videos.
//!
//! The index is a snapshot of the storage directory taken at pass start —
//! byte size mapped to the filenames carrying that size — plus whatever the
//! engine appends during the pass. It is never persisted: the next pass
//! rebuilds it from disk, so it stays truthful across crashes and restarts.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::paths::VIDEO_SUFFIX;

#[derive(Debug, Default)]
pub struct DedupIndex {
    by_size: HashMap<u64, Vec<String>>,
}

impl DedupIndex {
    /// Scan `dir` once, recording `(size, filename)` for every stored video.
    ///
    /// Creates the directory when missing. Only regular files ending in
    /// `.mp4` participate; anything else (including `.part` leftovers) is
    /// invisible to duplicate checks.
    pub fn build(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut by_size: HashMap<u64, Vec<String>> = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !name.ends_with(VIDEO_SUFFIX) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            by_size.entry(metadata.len()).or_default().push(name);
        }
        Ok(Self { by_size })
    }

    /// True when some stored file of exactly `size` bytes carries `label`
    /// in its name. A size-and-substring heuristic, not a content check.
    pub fn matches(&self, size: u64, label: &str) -> bool {
        self.by_size
            .get(&size)
            .is_some_and(|names| names.iter().any(|name| name.contains(label)))
    }

    /// Record a freshly written file so later items in the same pass see it.
    pub fn record(&mut self, size: u64, filename: String) {
        self.by_size.entry(size).or_default().push(filename);
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.by_size.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_size.is_empty()
    }
}
