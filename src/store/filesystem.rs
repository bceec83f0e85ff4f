use std::fs;
use std::path::{Path, PathBuf};

use cid::Cid;

use super::{BlockFormat, ContentStore};
use crate::error::{Error, Result};

/// Content-addressed block directory on the local filesystem.
///
/// Blocks are named by their CID and computed the same way an IPFS node
/// would, so CIDs returned here match the ones `ipfs dag put` produces.
pub struct FilesystemBlockStore {
    base_path: PathBuf,
}

impl FilesystemBlockStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        FilesystemBlockStore {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Create the blocks directory
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).map_err(|e| {
            Error::store(format!(
                "failed to create blocks directory {:?}: {}",
                self.base_path, e
            ))
        })
    }

    fn block_path(&self, cid: &Cid) -> PathBuf {
        self.base_path.join(cid.to_string())
    }
}

impl ContentStore for FilesystemBlockStore {
    fn put(&self, bytes: &[u8], format: BlockFormat) -> Result<Cid> {
        let cid = format.cid_for(bytes)?;
        let path = self.block_path(&cid);

        // Blocks are immutable; only write if absent
        if !path.exists() {
            let temp_path = self.base_path.join(format!(".{}.tmp", cid));
            fs::write(&temp_path, bytes)
                .and_then(|_| fs::rename(&temp_path, &path))
                .map_err(|e| Error::store(format!("failed to write block {}: {}", cid, e)))?;
        }

        Ok(cid)
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>> {
        fs::read(self.block_path(cid))
            .map_err(|e| Error::store(format!("failed to read block {}: {}", cid, e)))
    }
}
