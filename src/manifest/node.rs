//! Path-tree of pushed references, encoded as DAG-CBOR

use std::collections::BTreeMap;
use std::convert::Infallible;

use cid::Cid;
use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};

use crate::error::{Error, Result};

/// CBOR tag DAG-CBOR uses for CID links
const CID_TAG: u64 = 42;

/// Nesting deeper than any sane ref name; guards the recursive decoder
const MAX_DEPTH: usize = 64;

/// One node of the reference manifest.
///
/// `refs/heads/master -> cid` is stored as
/// `Branch{refs: Branch{heads: Branch{master: Leaf(cid)}}}`. Leaves are
/// written as IPLD links, which the DAG-JSON view shows as `{"/": cid}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestNode {
    Branch(BTreeMap<String, ManifestNode>),
    Leaf(Cid),
}

impl Default for ManifestNode {
    fn default() -> Self {
        ManifestNode::Branch(BTreeMap::new())
    }
}

impl ManifestNode {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the leaf at `path` (segments separated by `/`), creating
    /// intermediate branches as needed.
    ///
    /// A leaf found where a branch is needed is replaced by a branch, and
    /// whatever sits at the final segment is replaced by the new leaf.
    pub fn insert(&mut self, path: &str, cid: Cid) -> Result<()> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::encoding(format!("invalid reference path '{}'", path)));
        }

        let Some((last, parents)) = segments.split_last() else {
            return Err(Error::encoding("empty reference path"));
        };

        let mut node = self;
        for segment in parents {
            node = node
                .children_mut()
                .entry(segment.to_string())
                .or_insert_with(ManifestNode::empty);
        }
        node.children_mut()
            .insert(last.to_string(), ManifestNode::Leaf(cid));
        Ok(())
    }

    fn children_mut(&mut self) -> &mut BTreeMap<String, ManifestNode> {
        if let ManifestNode::Leaf(cid) = self {
            tracing::warn!("manifest: replacing link {} with a directory", cid);
            *self = ManifestNode::empty();
        }
        match self {
            ManifestNode::Branch(children) => children,
            ManifestNode::Leaf(_) => unreachable!("leaf replaced above"),
        }
    }

    /// Node at `path`, if present
    pub fn get(&self, path: &str) -> Option<&ManifestNode> {
        path.split('/').try_fold(self, |node, segment| match node {
            ManifestNode::Branch(children) => children.get(segment),
            ManifestNode::Leaf(_) => None,
        })
    }

    /// CID linked at `path`, if `path` names a leaf
    pub fn link(&self, path: &str) -> Option<Cid> {
        match self.get(path)? {
            ManifestNode::Leaf(cid) => Some(*cid),
            ManifestNode::Branch(_) => None,
        }
    }

    /// All leaves as `(path, cid)`, in path order
    pub fn leaves(&self) -> Vec<(String, Cid)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves(&self, prefix: &str, out: &mut Vec<(String, Cid)>) {
        match self {
            ManifestNode::Leaf(cid) => out.push((prefix.to_string(), *cid)),
            ManifestNode::Branch(children) => {
                for (name, child) in children {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{}/{}", prefix, name)
                    };
                    child.collect_leaves(&path, out);
                }
            }
        }
    }

    /// Canonical DAG-CBOR bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        encode_node(&mut enc, self)
            .map_err(|e| Error::encoding(format!("failed to encode manifest: {}", e)))?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let node = decode_node(&mut dec, 0)?;
        if dec.position() != bytes.len() {
            return Err(Error::encoding("trailing bytes after manifest node"));
        }
        Ok(node)
    }
}

fn encode_node(
    enc: &mut Encoder<&mut Vec<u8>>,
    node: &ManifestNode,
) -> std::result::Result<(), minicbor::encode::Error<Infallible>> {
    match node {
        ManifestNode::Leaf(cid) => {
            // Link bytes carry a leading 0x00 (identity multibase)
            let mut link = vec![0u8];
            link.extend_from_slice(&cid.to_bytes());
            enc.tag(Tag::new(CID_TAG))?.bytes(&link)?;
        }
        ManifestNode::Branch(children) => {
            // DAG-CBOR orders map keys by length, then bytewise
            let mut keys: Vec<&String> = children.keys().collect();
            keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

            enc.map(keys.len() as u64)?;
            for key in keys {
                enc.str(key)?;
                encode_node(enc, &children[key])?;
            }
        }
    }
    Ok(())
}

fn decode_node(dec: &mut Decoder<'_>, depth: usize) -> Result<ManifestNode> {
    if depth > MAX_DEPTH {
        return Err(Error::encoding("manifest nested too deeply"));
    }

    match dec.datatype().map_err(cbor_error)? {
        Type::Map => {
            let len = dec
                .map()
                .map_err(cbor_error)?
                .ok_or_else(|| Error::encoding("indefinite-length map in manifest"))?;
            let mut children = BTreeMap::new();
            for _ in 0..len {
                let key = dec.str().map_err(cbor_error)?.to_string();
                let child = decode_node(dec, depth + 1)?;
                if children.insert(key.clone(), child).is_some() {
                    return Err(Error::encoding(format!("duplicate manifest key '{}'", key)));
                }
            }
            Ok(ManifestNode::Branch(children))
        }
        Type::Tag => {
            let tag = dec.tag().map_err(cbor_error)?;
            if tag.as_u64() != CID_TAG {
                return Err(Error::encoding(format!(
                    "unexpected CBOR tag {} in manifest",
                    tag.as_u64()
                )));
            }
            let link = dec.bytes().map_err(cbor_error)?;
            let cid_bytes = link
                .strip_prefix(&[0u8])
                .ok_or_else(|| Error::encoding("link without multibase prefix"))?;
            let cid = Cid::try_from(cid_bytes)
                .map_err(|e| Error::encoding(format!("invalid link in manifest: {}", e)))?;
            Ok(ManifestNode::Leaf(cid))
        }
        other => Err(Error::encoding(format!(
            "unexpected {:?} in manifest",
            other
        ))),
    }
}

fn cbor_error(e: minicbor::decode::Error) -> Error {
    Error::encoding(format!("cbor decode: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ObjectId;
    use crate::store::expected_cid;

    fn cid(byte: u8) -> Cid {
        expected_cid(&ObjectId::from_bytes(&[byte; 20]).unwrap()).unwrap()
    }

    #[test]
    fn test_insert_creates_intermediate_branches() {
        let mut root = ManifestNode::empty();
        root.insert("refs/heads/master", cid(1)).unwrap();

        assert_eq!(root.link("refs/heads/master"), Some(cid(1)));
        assert!(matches!(root.get("refs/heads"), Some(ManifestNode::Branch(_))));
        assert_eq!(root.link("refs/heads"), None);
        assert_eq!(root.get("refs/tags"), None);
    }

    #[test]
    fn test_insert_overwrites_existing_leaf() {
        let mut root = ManifestNode::empty();
        root.insert("refs/heads/master", cid(1)).unwrap();
        root.insert("refs/heads/master", cid(2)).unwrap();
        assert_eq!(root.leaves(), vec![("refs/heads/master".to_string(), cid(2))]);
    }

    #[test]
    fn test_insert_through_leaf_replaces_it() {
        let mut root = ManifestNode::empty();
        root.insert("a", cid(1)).unwrap();
        root.insert("a/b", cid(2)).unwrap();
        assert_eq!(root.link("a/b"), Some(cid(2)));
        assert_eq!(root.link("a"), None);
    }

    #[test]
    fn test_insert_rejects_empty_segments() {
        let mut root = ManifestNode::empty();
        assert!(root.insert("", cid(1)).is_err());
        assert!(root.insert("refs//x", cid(1)).is_err());
        assert!(root.insert("refs/x/", cid(1)).is_err());
        assert_eq!(root, ManifestNode::empty());
    }

    #[test]
    fn test_leaf_encodes_as_tagged_link() {
        let mut root = ManifestNode::empty();
        root.insert("a", cid(1)).unwrap();
        let bytes = root.encode().unwrap();

        // {"a": 42(h'00' || cid)} where the cid is 24 bytes (v1, git-raw, sha1)
        assert_eq!(
            &bytes[..12],
            &[0xa1, 0x61, b'a', 0xd8, 0x2a, 0x58, 25, 0x00, 0x01, 0x78, 0x11, 0x14]
        );
        assert_eq!(bytes.len(), 12 + 20);
    }

    #[test]
    fn test_keys_are_length_first_ordered() {
        let mut root = ManifestNode::empty();
        root.insert("bb", cid(1)).unwrap();
        root.insert("c", cid(2)).unwrap();
        root.insert("a", cid(3)).unwrap();
        let bytes = root.encode().unwrap();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.map().unwrap(), Some(3));
        let mut keys = Vec::new();
        for _ in 0..3 {
            keys.push(dec.str().unwrap().to_string());
            dec.skip().unwrap();
        }
        assert_eq!(keys, vec!["a", "c", "bb"]);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let mut root = ManifestNode::empty();
        root.insert("refs/heads/master", cid(1)).unwrap();
        root.insert("refs/heads/feature/x", cid(2)).unwrap();
        root.insert("refs/tags/v1", cid(3)).unwrap();

        let decoded = ManifestNode::decode(&root.encode().unwrap()).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_decode_rejects_non_manifest_values() {
        // bare unsigned integer
        assert!(ManifestNode::decode(&[0x01]).is_err());
        // map with a text value instead of a link
        assert!(ManifestNode::decode(&[0xa1, 0x61, b'a', 0x61, b'b']).is_err());
        // trailing bytes
        assert!(ManifestNode::decode(&[0xa0, 0xa0]).is_err());
    }
}
