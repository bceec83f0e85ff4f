//! Breadth-first transfer of a commit-rooted object graph

use std::collections::VecDeque;

use super::PushContext;
use crate::error::{Error, Result};
use crate::git::{links, ObjectId, ObjectStore};
use crate::store::{expected_cid, BlockFormat, ContentStore};
use crate::tracker::Tracker;

/// Pushes git objects into the content store, skipping anything the tracker
/// has already seen.
pub struct PushEngine<'a, O, C, T> {
    objects: &'a O,
    store: &'a C,
    tracker: &'a T,
}

impl<'a, O, C, T> PushEngine<'a, O, C, T>
where
    O: ObjectStore,
    C: ContentStore,
    T: Tracker,
{
    pub fn new(objects: &'a O, store: &'a C, tracker: &'a T) -> Self {
        Self {
            objects,
            store,
            tracker,
        }
    }

    /// Transfer every object reachable from `root` that is not yet tracked.
    ///
    /// Any failure aborts the walk. Objects marked before the failure stay
    /// marked, so re-running the same push only does the remaining work.
    pub fn push(&self, root: ObjectId, ctx: &mut PushContext) -> Result<()> {
        let mut worklist = VecDeque::new();
        worklist.push_back(root);
        ctx.queue();

        while let Some(id) = worklist.pop_front() {
            if self.has_entry(&id)? {
                ctx.skip();
                continue;
            }

            let expected = expected_cid(&id).map_err(|e| e.context("push"))?;

            let object = self.objects.object(&id).map_err(|e| match e {
                Error::Retrieval(_) => e.context("push"),
                other => Error::retrieval(format!("push: read object {}: {}", id, other)),
            })?;
            let raw = object.transcode();

            ctx.complete(&id, &expected);

            let actual = self
                .store
                .put(&raw, BlockFormat::GitRaw)
                .map_err(|e| e.context("push"))?;

            // Marked before verification; a mismatch ends the process anyway
            self.tracker
                .add_entry(&id)
                .map_err(|e| e.context("push"))?;

            if actual != expected {
                return Err(Error::Integrity {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }

            for child in links(&raw).map_err(|e| e.context("push/process"))? {
                if self.has_entry(&child)? {
                    continue;
                }
                ctx.queue();
                worklist.push_back(child);
            }
        }

        ctx.finish();
        Ok(())
    }

    fn has_entry(&self, id: &ObjectId) -> Result<bool> {
        self.tracker
            .has_entry(id)
            .map_err(|e| e.context("push/process"))
    }
}
