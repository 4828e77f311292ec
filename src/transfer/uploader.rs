//! Content mirroring onto the remote filesystem.
//!
//! Two strictly ordered phases: every collected remote directory is
//! created before any file upload begins, so no upload can reference a
//! directory that does not exist yet. Within the upload phase,
//! independent files are dispatched concurrently up to a bound.

use futures::stream::{self, TryStreamExt};
use std::path::{Component, Path};
use tracing::{debug, info};

use crate::error::{PublishError, Result};

use super::session::TransferSession;
use super::walker::SiteTree;

/// Remote root all site content lives under.
pub const REMOTE_ROOT: &str = "/site/wwwroot";

/// Default number of concurrent file uploads.
const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// Mirrors a collected site tree over an open transfer session.
pub struct ContentUploader<'a> {
    /// Session to mirror over.
    session: &'a dyn TransferSession,
    /// Local site root the collected paths are relative to.
    site_root: &'a Path,
    /// Upload-phase concurrency bound.
    concurrency: usize,
}

impl<'a> ContentUploader<'a> {
    /// Creates an uploader for the given session and site root.
    #[must_use]
    pub fn new(session: &'a dyn TransferSession, site_root: &'a Path) -> Self {
        Self {
            session,
            site_root,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }

    /// Sets the upload-phase concurrency bound.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Mirrors the tree: directory phase, then upload phase.
    ///
    /// # Errors
    ///
    /// A single entry's failure aborts its phase and is returned
    /// unchanged; the caller owns closing the session.
    pub async fn mirror(&self, tree: &SiteTree) -> Result<()> {
        self.create_directories(tree).await?;
        self.upload_files(tree).await?;

        info!(
            "Mirrored {} directories and {} files under {REMOTE_ROOT}",
            tree.directories.len(),
            tree.files.len()
        );

        Ok(())
    }

    /// Creates every collected remote directory.
    ///
    /// Remote mkdir is not recursive and the walk guarantees ancestors
    /// precede their children, so creation stays sequential.
    async fn create_directories(&self, tree: &SiteTree) -> Result<()> {
        for dir in &tree.directories {
            let remote = remote_path(self.site_root, dir)?;
            self.session.make_dir(&remote).await?;
            debug!("Remote directory '{remote}' created");
        }

        Ok(())
    }

    /// Uploads every collected file, independent files concurrently.
    async fn upload_files(&self, tree: &SiteTree) -> Result<()> {
        stream::iter(tree.files.iter().map(Ok::<_, PublishError>))
            .try_for_each_concurrent(self.concurrency, |file| async move {
                let remote = remote_path(self.site_root, file)?;
                self.session.put_file(file, &remote).await?;
                debug!("File '{}' uploaded to '{remote}'", file.display());
                Ok(())
            })
            .await
    }
}

/// Maps a local path under the site root to its remote counterpart.
///
/// The result always uses forward slashes, regardless of the local
/// separator style.
///
/// # Errors
///
/// Returns an error if the path lies outside the site root or contains
/// non-normal components.
pub fn remote_path(site_root: &Path, local: &Path) -> Result<String> {
    let relative = local.strip_prefix(site_root).map_err(|_| {
        PublishError::internal(format!(
            "path '{}' is outside the site root '{}'",
            local.display(),
            site_root.display()
        ))
    })?;

    let mut remote = String::from(REMOTE_ROOT);
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                remote.push('/');
                remote.push_str(&part.to_string_lossy());
            }
            _ => {
                return Err(PublishError::internal(format!(
                    "unsupported path component in '{}'",
                    local.display()
                )));
            }
        }
    }

    Ok(remote.replace('\\', "/"))
}
