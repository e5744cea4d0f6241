//! Ordered file list for the merge tool

use tracing::{debug, warn};
use uuid::Uuid;

use crate::intake::PendingFile;

/// Files queued for merging, in output order
///
/// Entries are kept distinct by identity, so the same file name may appear
/// more than once. The merge action is enabled whenever the list holds at
/// least one entry; that state is recomputed after every mutation.
#[derive(Debug, Default)]
pub struct OrderedFileList {
    entries: Vec<PendingFile>,
    action_enabled: bool,
}

impl OrderedFileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append files to the end of the list
    ///
    /// Non-PDF files are skipped. Returns the names of skipped files.
    pub fn append<I>(&mut self, files: I) -> Vec<String>
    where
        I: IntoIterator<Item = PendingFile>,
    {
        let mut rejected = Vec::new();
        for file in files {
            if file.is_pdf() {
                debug!(file = %file.name(), id = %file.id(), "queued for merge");
                self.entries.push(file);
            } else {
                warn!(file = %file.name(), "skipping non-PDF file");
                rejected.push(file.name().to_string());
            }
        }
        self.refresh();
        rejected
    }

    /// Remove an entry; returns it if it was present
    pub fn remove(&mut self, id: Uuid) -> Option<PendingFile> {
        let removed = self
            .position(id)
            .map(|idx| self.entries.remove(idx));
        self.refresh();
        removed
    }

    /// Move an entry one position earlier. No-op for the first entry.
    pub fn move_up(&mut self, id: Uuid) -> bool {
        let moved = match self.position(id) {
            Some(idx) if idx > 0 => {
                self.entries.swap(idx, idx - 1);
                true
            }
            _ => false,
        };
        self.refresh();
        moved
    }

    /// Move an entry one position later. No-op for the last entry.
    pub fn move_down(&mut self, id: Uuid) -> bool {
        let moved = match self.position(id) {
            Some(idx) if idx + 1 < self.entries.len() => {
                self.entries.swap(idx, idx + 1);
                true
            }
            _ => false,
        };
        self.refresh();
        moved
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.refresh();
    }

    pub fn is_action_enabled(&self) -> bool {
        self.action_enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingFile> {
        self.entries.iter()
    }

    /// Copy of the current order, taken when a merge starts
    pub fn snapshot(&self) -> Vec<PendingFile> {
        self.entries.clone()
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|f| f.id() == id)
    }

    fn refresh(&mut self) {
        self.action_enabled = !self.entries.is_empty();
    }
}
