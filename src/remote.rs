use crate::git::ObjectStore;
use crate::store::ContentStore;
use crate::tracker::Tracker;

/// Collaborators and settings for one remote-helper session
pub struct Remote<O, C, T> {
    pub objects: O,
    pub store: C,
    pub tracker: T,
    /// Hash given in the `ipld::<hash>` URL, used to bootstrap clones
    pub remote_hash: Option<String>,
    /// Draw the push progress line on stderr
    pub progress: bool,
}

impl<O, C, T> Remote<O, C, T>
where
    O: ObjectStore,
    C: ContentStore,
    T: Tracker,
{
    pub fn new(objects: O, store: C, tracker: T, remote_hash: Option<String>) -> Self {
        Self {
            objects,
            store,
            tracker,
            remote_hash,
            progress: true,
        }
    }
}
