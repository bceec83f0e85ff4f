//! CID derivation for the two block formats pushed to the content store

use cid::{multihash::Multihash, Cid};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::git::ObjectId;

/// Multicodec for raw git objects
pub const GIT_RAW_CODEC: u64 = 0x78;
/// Multicodec for DAG-CBOR nodes
pub const DAG_CBOR_CODEC: u64 = 0x71;
/// Multihash code for SHA-1
pub const SHA1_CODE: u64 = 0x11;
/// Multihash code for SHA2-256
pub const SHA2_256_CODE: u64 = 0x12;

/// How a block is submitted to and addressed by the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFormat {
    /// Transcoded git object, addressed by its git SHA-1
    GitRaw,
    /// Serialized manifest node
    DagCbor,
}

impl BlockFormat {
    pub fn codec(&self) -> u64 {
        match self {
            BlockFormat::GitRaw => GIT_RAW_CODEC,
            BlockFormat::DagCbor => DAG_CBOR_CODEC,
        }
    }

    pub fn hash_code(&self) -> u64 {
        match self {
            BlockFormat::GitRaw => SHA1_CODE,
            BlockFormat::DagCbor => SHA2_256_CODE,
        }
    }

    /// Name of the input encoding understood by `ipfs dag put`
    pub fn input_codec(&self) -> &'static str {
        match self {
            BlockFormat::GitRaw => "raw",
            BlockFormat::DagCbor => "dag-cbor",
        }
    }

    pub fn store_codec(&self) -> &'static str {
        match self {
            BlockFormat::GitRaw => "git-raw",
            BlockFormat::DagCbor => "dag-cbor",
        }
    }

    pub fn hash_name(&self) -> &'static str {
        match self {
            BlockFormat::GitRaw => "sha1",
            BlockFormat::DagCbor => "sha2-256",
        }
    }

    /// CID of `bytes` stored in this format
    pub fn cid_for(&self, bytes: &[u8]) -> Result<Cid> {
        let digest = match self {
            BlockFormat::GitRaw => Sha1::digest(bytes).to_vec(),
            BlockFormat::DagCbor => Sha256::digest(bytes).to_vec(),
        };
        wrap(self.codec(), self.hash_code(), &digest)
    }
}

fn wrap(codec: u64, hash_code: u64, digest: &[u8]) -> Result<Cid> {
    let mh = Multihash::<64>::wrap(hash_code, digest)
        .map_err(|e| Error::encoding(format!("failed to build multihash: {}", e)))?;
    Ok(Cid::new_v1(codec, mh))
}

/// CID a git object must end up with, derived from its identity alone
pub fn expected_cid(id: &ObjectId) -> Result<Cid> {
    wrap(GIT_RAW_CODEC, SHA1_CODE, id.as_bytes())
}

/// Parse the text form of a CID
pub fn parse_cid(text: &str) -> Result<Cid> {
    text.trim()
        .parse::<Cid>()
        .map_err(|e| Error::encoding(format!("invalid CID '{}': {}", text.trim(), e)))
}
