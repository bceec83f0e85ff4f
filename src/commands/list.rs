use std::io::Write;

use anyhow::Result;

use crate::error::{self, Error};
use crate::git::{ObjectId, ObjectStore, RefTarget};
use crate::remote::Remote;
use crate::store::ContentStore;
use crate::tracker::Tracker;

/// Branch git creates when cloning a bare `ipld::<hash>` URL
const CLONE_BRANCH: &str = "refs/heads/master";

/// Handle the list command
pub fn handle<O, C, T, W>(remote: &Remote<O, C, T>, output: &mut W, for_push: bool) -> Result<()>
where
    O: ObjectStore,
    C: ContentStore,
    T: Tracker,
    W: Write,
{
    let lines = list_refs(
        &remote.objects,
        &remote.tracker,
        for_push,
        remote.remote_hash.as_deref(),
    )?;

    for line in &lines {
        writeln!(output, "{}", line)?;
    }
    writeln!(output)?; // Empty line signals completion

    Ok(())
}

/// Build the ref listing reported to git.
///
/// Each local branch is reported at the commit last pushed for it, or the
/// null id if it was never pushed. When fetching, the branch HEAD points at
/// is reported at `remote_hash` instead, and an empty repository gets a
/// synthetic `refs/heads/master` so `git clone ipld::<hash>` works. The
/// last line always describes HEAD.
pub fn list_refs<O, T>(
    objects: &O,
    tracker: &T,
    for_push: bool,
    remote_hash: Option<&str>,
) -> error::Result<Vec<String>>
where
    O: ObjectStore,
    T: Tracker,
{
    let head = objects
        .resolve_reference("HEAD")
        .map_err(|e| e.context("list"))?;
    let branches = objects.branches().map_err(|e| e.context("list"))?;

    let fetch_hash = if for_push { None } else { remote_hash };
    let mut out = Vec::with_capacity(branches.len() + 2);

    for branch in &branches {
        let head_target = matches!(&head.target, RefTarget::Symbolic(target) if *target == branch.name);

        match fetch_hash {
            Some(hash) if head_target => {
                out.push(format!("{} {}", parse_remote_hash(hash)?, branch.name));
            }
            _ => {
                let tracked = tracker
                    .slot(&branch.name)
                    .map_err(|e| e.context("list"))?
                    .map(|bytes| {
                        ObjectId::from_bytes(&bytes).map_err(|_| {
                            Error::tracker(format!("list: corrupt slot for {}", branch.name))
                        })
                    })
                    .transpose()?
                    .unwrap_or(ObjectId::NULL);
                out.push(format!("{} {}", tracked, branch.name));
            }
        }
    }

    if branches.is_empty() {
        if let Some(hash) = fetch_hash {
            out.push(format!("{} {}", parse_remote_hash(hash)?, CLONE_BRANCH));
        }
    }

    match &head.target {
        RefTarget::Direct(id) => out.push(format!("{} {}", id, head.name)),
        RefTarget::Symbolic(target) => out.push(format!("@{} {}", target, head.name)),
    }

    Ok(out)
}

fn parse_remote_hash(hash: &str) -> error::Result<ObjectId> {
    ObjectId::from_hex(hash).map_err(|e| e.context("list"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Reference;
    use crate::testing::{MemoryContentStore, MemoryObjectStore, MemoryTracker};

    const REMOTE: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_bytes(&[byte; 20]).unwrap()
    }

    fn repo_with_branches() -> MemoryObjectStore {
        let mut objects = MemoryObjectStore::new();
        objects.set_branch("refs/heads/master", oid(1));
        objects.set_branch("refs/heads/topic", oid(2));
        objects.set_head(Reference::symbolic("HEAD", "refs/heads/master"));
        objects
    }

    #[test]
    fn test_empty_repo_clone_bootstrap() {
        let mut objects = MemoryObjectStore::new();
        objects.set_head(Reference::symbolic("HEAD", "refs/heads/master"));
        let tracker = MemoryTracker::new();

        let lines = list_refs(&objects, &tracker, false, Some(REMOTE)).unwrap();
        assert_eq!(
            lines,
            vec![
                format!("{} refs/heads/master", REMOTE),
                "@refs/heads/master HEAD".to_string(),
            ]
        );
    }

    #[test]
    fn test_bad_remote_hash_fails_listing() {
        let mut objects = MemoryObjectStore::new();
        objects.set_head(Reference::symbolic("HEAD", "refs/heads/master"));
        let tracker = MemoryTracker::new();

        for bad in ["deadbeef", "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefaa", "xyz"] {
            let result = list_refs(&objects, &tracker, false, Some(bad));
            assert!(matches!(result, Err(Error::Encoding(_))), "accepted {}", bad);
        }
    }

    #[test]
    fn test_bad_remote_hash_writes_nothing() {
        let mut objects = MemoryObjectStore::new();
        objects.set_head(Reference::symbolic("HEAD", "refs/heads/master"));
        let remote = Remote::new(
            objects,
            MemoryContentStore::new(),
            MemoryTracker::new(),
            Some("abc".to_string()),
        );

        let mut output = Vec::new();
        assert!(handle(&remote, &mut output, false).is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn test_untracked_branches_report_null_id() {
        let objects = repo_with_branches();
        let tracker = MemoryTracker::new();
        tracker.set_slot("refs/heads/topic", oid(9).as_bytes()).unwrap();

        let lines = list_refs(&objects, &tracker, true, Some(REMOTE)).unwrap();
        assert_eq!(
            lines,
            vec![
                format!("{} refs/heads/master", ObjectId::NULL),
                format!("{} refs/heads/topic", oid(9)),
                "@refs/heads/master HEAD".to_string(),
            ]
        );
    }

    #[test]
    fn test_fetch_overrides_head_branch_only() {
        let objects = repo_with_branches();
        let tracker = MemoryTracker::new();

        let lines = list_refs(&objects, &tracker, false, Some(REMOTE)).unwrap();
        assert_eq!(lines[0], format!("{} refs/heads/master", REMOTE));
        assert_eq!(lines[1], format!("{} refs/heads/topic", ObjectId::NULL));
    }

    #[test]
    fn test_fetch_without_remote_hash_uses_tracker() {
        let objects = repo_with_branches();
        let tracker = MemoryTracker::new();
        tracker.set_slot("refs/heads/master", oid(5).as_bytes()).unwrap();

        let lines = list_refs(&objects, &tracker, false, None).unwrap();
        assert_eq!(lines[0], format!("{} refs/heads/master", oid(5)));
    }

    #[test]
    fn test_detached_head_line() {
        let mut objects = repo_with_branches();
        objects.set_head(Reference::direct("HEAD", oid(1)));
        let tracker = MemoryTracker::new();

        let lines = list_refs(&objects, &tracker, false, Some(REMOTE)).unwrap();
        assert_eq!(lines.last().unwrap(), &format!("{} HEAD", oid(1)));
        // No symbolic HEAD, so nothing is overridden
        assert_eq!(lines[0], format!("{} refs/heads/master", ObjectId::NULL));
    }

    #[test]
    fn test_enumeration_failure_is_fatal() {
        let objects = repo_with_branches();
        objects.fail_branches.set(true);
        let tracker = MemoryTracker::new();

        assert!(matches!(
            list_refs(&objects, &tracker, false, None),
            Err(Error::Retrieval(_))
        ));
    }

    #[test]
    fn test_corrupt_tracker_slot_is_tracker_error() {
        let objects = repo_with_branches();
        let tracker = MemoryTracker::new();
        tracker.set_slot("refs/heads/master", b"short").unwrap();

        assert!(matches!(
            list_refs(&objects, &tracker, true, None),
            Err(Error::Tracker(_))
        ));
    }
}
