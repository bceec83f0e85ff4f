use cid::Cid;

use super::ManifestNode;
use crate::error::{Error, Result};
use crate::store::{parse_cid, BlockFormat, ContentStore};
use crate::tracker::{Tracker, MANIFEST_SLOT};

/// Folds pushed references into the manifest stored in the content store.
///
/// Each update writes a brand-new root and then repoints the tracker's
/// manifest slot at it; previous roots stay addressable by their own CID.
pub struct ManifestBuilder<'a, C, T> {
    store: &'a C,
    tracker: &'a T,
}

impl<'a, C, T> ManifestBuilder<'a, C, T>
where
    C: ContentStore,
    T: Tracker,
{
    pub fn new(store: &'a C, tracker: &'a T) -> Self {
        Self { store, tracker }
    }

    /// CID of the current manifest root, if one was ever written
    fn current_root(&self) -> Result<Option<Vec<u8>>> {
        self.tracker
            .slot(MANIFEST_SLOT)
            .map_err(|e| e.context("manifest"))
    }

    /// Current manifest, or an empty one.
    ///
    /// A root that cannot be fetched or decoded is treated like a missing
    /// one, which drops the previous manifest on the next update.
    pub fn load(&self) -> Result<ManifestNode> {
        let Some(raw) = self.current_root()? else {
            return Ok(ManifestNode::empty());
        };

        let loaded = String::from_utf8(raw)
            .map_err(|_| Error::encoding("manifest slot is not a CID"))
            .and_then(|text| parse_cid(&text))
            .and_then(|cid| {
                let bytes = self.store.get(&cid)?;
                ManifestNode::decode(&bytes)
            });

        match loaded {
            Ok(node) => Ok(node),
            Err(e) => {
                tracing::warn!("manifest: could not load previous root, starting empty: {}", e);
                Ok(ManifestNode::empty())
            }
        }
    }

    /// Record `ref_name -> cid` and return the CID of the new manifest root
    pub fn update(&self, ref_name: &str, cid: &Cid) -> Result<Cid> {
        if ref_name == MANIFEST_SLOT {
            return Err(Error::encoding(format!(
                "manifest: '{}' is reserved and not a valid reference name",
                ref_name
            )));
        }

        let mut root = self.load()?;
        if let Some(previous) = root.link(ref_name) {
            tracing::debug!("manifest: {} was {}", ref_name, previous);
        }
        root.insert(ref_name, *cid)
            .map_err(|e| e.context("manifest"))?;

        let bytes = root.encode()?;
        let root_cid = self
            .store
            .put(&bytes, BlockFormat::DagCbor)
            .map_err(|e| e.context("manifest"))?;

        self.tracker
            .set_slot(MANIFEST_SLOT, root_cid.to_string().as_bytes())
            .map_err(|e| e.context("manifest"))?;

        tracing::debug!(
            "manifest: {} -> {}, root {} ({} refs)",
            ref_name,
            cid,
            root_cid,
            root.leaves().len()
        );
        Ok(root_cid)
    }
}
