//! Content transfer module.
//!
//! This module walks the local site tree and mirrors it onto the remote
//! filesystem over a secure transfer session: directories first, then
//! files.

mod session;
mod uploader;
mod walker;

pub use session::{FtpsConnector, FtpsSession, TransferConnector, TransferSession};
pub use uploader::{remote_path, ContentUploader, REMOTE_ROOT};
pub use walker::{DirectoryWalker, SiteTree};
