use crate::error::Result;
use crate::git::ObjectId;

/// Slot key holding the manifest root CID.
///
/// `..` is not a legal git reference name, so it never collides with a
/// per-reference slot.
pub const MANIFEST_SLOT: &str = "..";

/// Durable record of what has already been pushed
pub trait Tracker {
    /// Whether the object was already transferred to the content store
    fn has_entry(&self, id: &ObjectId) -> Result<bool>;

    /// Mark the object as transferred. Entries are never removed.
    fn add_entry(&self, id: &ObjectId) -> Result<()>;

    /// Read a named slot, `None` if it was never set
    fn slot(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite a named slot
    fn set_slot(&self, name: &str, value: &[u8]) -> Result<()>;
}
