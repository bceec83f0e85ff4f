//! Git object identities and the canonical `"<kind> <size>\0"` preimage

use std::fmt;

use gix_object::Kind;
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// Length of a SHA-1 object identity in bytes
pub const OID_LEN: usize = 20;

/// Git SHA-1 object identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    /// All-zero identity, reported to git for refs that were never pushed
    pub const NULL: ObjectId = ObjectId([0; OID_LEN]);

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let digest: [u8; OID_LEN] = bytes.try_into().map_err(|_| {
            Error::encoding(format!(
                "invalid hash length: expected {} bytes, got {}",
                OID_LEN,
                bytes.len()
            ))
        })?;
        Ok(ObjectId(digest))
    }

    /// Parse the 40 character hex form
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::encoding(format!("invalid hash '{}': {}", hex_str, e)))?;
        Self::from_bytes(&bytes)
    }

    /// Identity git would assign to an object with this kind and payload
    pub fn for_object(kind: Kind, data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(header(kind, data.len() as u64));
        hasher.update(data);
        ObjectId(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0; OID_LEN]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// Object as read from the local object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedObject {
    pub kind: Kind,
    /// Size recorded in the object header
    pub size: u64,
    pub data: Vec<u8>,
}

impl TypedObject {
    pub fn new(kind: Kind, data: Vec<u8>) -> Self {
        Self {
            kind,
            size: data.len() as u64,
            data,
        }
    }

    /// Serialize to `"<kind> <size>\0" + payload`, the bytes git hashes
    pub fn transcode(&self) -> Vec<u8> {
        let header = header(self.kind, self.size);
        let mut result = Vec::with_capacity(header.len() + self.data.len());
        result.extend_from_slice(&header);
        result.extend_from_slice(&self.data);
        result
    }
}

fn header(kind: Kind, size: u64) -> Vec<u8> {
    let mut header = kind.as_bytes().to_vec();
    header.push(b' ');
    header.extend_from_slice(size.to_string().as_bytes());
    header.push(0);
    header
}

/// Split transcoded bytes back into kind and payload, checking the size
pub fn split_header(transcoded: &[u8]) -> Result<(Kind, &[u8])> {
    let null_pos = transcoded
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::encoding("no null terminator in object header"))?;

    let header = std::str::from_utf8(&transcoded[..null_pos])
        .map_err(|_| Error::encoding("invalid UTF-8 in object header"))?;
    let (kind, size) = header
        .split_once(' ')
        .ok_or_else(|| Error::encoding(format!("invalid object header format: {}", header)))?;

    let kind = Kind::from_bytes(kind.as_bytes())
        .map_err(|_| Error::encoding(format!("unknown object type: {}", kind)))?;
    let size: usize = size
        .parse()
        .map_err(|_| Error::encoding(format!("invalid object size: {}", size)))?;

    let data = &transcoded[null_pos + 1..];
    if data.len() != size {
        return Err(Error::encoding(format!(
            "object header claims {} bytes, payload has {}",
            size,
            data.len()
        )));
    }

    Ok((kind, data))
}
