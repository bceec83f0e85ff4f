//! Child-link extraction from transcoded objects

use gix_object::{CommitRef, Kind, TagRef, TreeRef};

use super::object::{split_header, ObjectId};
use crate::error::{Error, Result};

/// List the object identities referenced by a transcoded object.
///
/// Commits yield their root tree followed by parents, trees yield entries in
/// order, tags yield their target. Gitlink entries are skipped: they name
/// commits in another repository and are never in the local object store.
pub fn links(transcoded: &[u8]) -> Result<Vec<ObjectId>> {
    let (kind, data) = split_header(transcoded)?;

    match kind {
        Kind::Blob => Ok(Vec::new()),
        Kind::Commit => {
            let commit = CommitRef::from_bytes(data)
                .map_err(|e| Error::encoding(format!("failed to parse commit: {}", e)))?;
            let mut out = vec![ObjectId::from_bytes(commit.tree().as_bytes())?];
            for parent in commit.parents() {
                out.push(ObjectId::from_bytes(parent.as_bytes())?);
            }
            Ok(out)
        }
        Kind::Tree => {
            let tree = TreeRef::from_bytes(data)
                .map_err(|e| Error::encoding(format!("failed to parse tree: {}", e)))?;
            tree.entries
                .iter()
                .filter(|entry| !entry.mode.is_commit())
                .map(|entry| ObjectId::from_bytes(entry.oid.as_bytes()))
                .collect()
        }
        Kind::Tag => {
            let tag = TagRef::from_bytes(data)
                .map_err(|e| Error::encoding(format!("failed to parse tag: {}", e)))?;
            Ok(vec![ObjectId::from_bytes(tag.target().as_bytes())?])
        }
    }
}
