//! Local site directory walker.
//!
//! Enumerates the site root into the two ordered sequences the transfer
//! stage consumes: directories first (ancestors always before their
//! children) and files. The tree is built fresh per publish run and
//! discarded once consumed.

use futures::future;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::Result;

/// The collected site content of one walk.
#[derive(Debug, Default, Clone)]
pub struct SiteTree {
    /// Every directory below the root, ancestors before descendants.
    pub directories: Vec<PathBuf>,
    /// Every file below the root.
    pub files: Vec<PathBuf>,
}

impl SiteTree {
    /// Returns true if the walk found nothing to publish.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    /// Total number of collected entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.directories.len() + self.files.len()
    }
}

/// Recursive directory walker for the site root.
#[derive(Debug, Default)]
pub struct DirectoryWalker;

impl DirectoryWalker {
    /// Creates a new walker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Walks the tree under `root`, classifying every entry.
    ///
    /// Directories are visited breadth-first, so a directory always
    /// appears in the output before anything it contains. Within one
    /// directory all entries are statted concurrently; the directory is
    /// complete only once every child's stat has resolved.
    ///
    /// # Errors
    ///
    /// Any read or stat failure aborts the entire walk; no partial tree
    /// escapes a failed walk.
    pub async fn walk(&self, root: &Path) -> Result<SiteTree> {
        let mut tree = SiteTree::default();
        let mut pending = VecDeque::from([root.to_path_buf()]);

        while let Some(dir) = pending.pop_front() {
            let mut entries = Vec::new();
            let mut read_dir = fs::read_dir(&dir).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                entries.push(entry.path());
            }

            let stats = future::try_join_all(entries.into_iter().map(|path| async move {
                let metadata = fs::metadata(&path).await?;
                Ok::<_, std::io::Error>((path, metadata.is_dir()))
            }))
            .await?;

            for (path, is_dir) in stats {
                if is_dir {
                    tree.directories.push(path.clone());
                    pending.push_back(path);
                } else {
                    tree.files.push(path);
                }
            }
        }

        debug!(
            "Walked '{}': {} directories, {} files",
            root.display(),
            tree.directories.len(),
            tree.files.len()
        );

        Ok(tree)
    }
}
