mod codec;
mod filesystem;
mod ipfs;
mod traits;

pub use codec::{expected_cid, parse_cid, BlockFormat};
pub use filesystem::FilesystemBlockStore;
pub use ipfs::IpfsStore;
pub use traits::ContentStore;
