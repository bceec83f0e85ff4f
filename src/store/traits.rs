use cid::Cid;

use super::BlockFormat;
use crate::error::Result;

/// Remote content-addressed block store
pub trait ContentStore {
    /// Store `bytes` in `format` and return the CID the store assigned.
    /// Storing the same bytes twice returns the same CID.
    fn put(&self, bytes: &[u8], format: BlockFormat) -> Result<Cid>;

    /// Fetch the raw bytes of a block.
    /// Returns error if the block doesn't exist.
    fn get(&self, cid: &Cid) -> Result<Vec<u8>>;
}
