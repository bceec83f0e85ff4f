//! Handle the push command

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use cid::Cid;

use crate::engine::{PushContext, PushEngine};
use crate::git::{ObjectId, ObjectStore};
use crate::manifest::ManifestBuilder;
use crate::remote::Remote;
use crate::store::{expected_cid, ContentStore};
use crate::tracker::Tracker;

/// One `push [+]<src>:<dst>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSpec {
    pub src: String,
    pub dst: String,
    pub force: bool,
}

impl PushSpec {
    /// Parse the part after `push `
    pub fn parse(spec: &str) -> Result<Self> {
        let (force, spec) = match spec.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let (src, dst) = spec
            .split_once(':')
            .with_context(|| format!("Invalid push refspec: {}", spec))?;
        Ok(Self {
            src: src.to_string(),
            dst: dst.to_string(),
            force,
        })
    }
}

/// Result of pushing one reference
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub head: ObjectId,
    pub head_cid: Cid,
    pub manifest_cid: Cid,
}

/// Handle a push batch. `first` is the spec from the line that started the
/// batch; further `push` lines are read until an empty line.
pub fn handle<O, C, T, W, R>(
    remote: &Remote<O, C, T>,
    output: &mut W,
    first: &str,
    lines: &mut std::io::Lines<R>,
) -> Result<()>
where
    O: ObjectStore,
    C: ContentStore,
    T: Tracker,
    W: Write,
    R: BufRead,
{
    let mut specs = vec![PushSpec::parse(first)?];

    #[allow(clippy::while_let_on_iterator)]
    while let Some(line) = lines.next() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        match line.strip_prefix("push ") {
            Some(spec) => specs.push(PushSpec::parse(spec)?),
            None => anyhow::bail!("Unexpected line in push batch: {}", line),
        }
    }

    for spec in &specs {
        if spec.src.is_empty() {
            writeln!(output, "error {} deleting refs is not supported", spec.dst)?;
            continue;
        }

        if spec.force {
            tracing::debug!("Forced update of {}", spec.dst);
        }

        let outcome = push_ref(remote, &spec.src, &spec.dst)
            .with_context(|| format!("command push: {}", spec.dst))?;

        tracing::info!("Pushed to IPFS as ipld::{}", outcome.head);
        tracing::info!("Head CID is {}", outcome.head_cid);
        tracing::info!("Repo CID is {}", outcome.manifest_cid);
        writeln!(output, "ok {}", spec.dst)?;
    }

    writeln!(output)?; // Empty line signals completion
    Ok(())
}

/// Push `src` and publish it as `dst`: transfer the object graph, record the
/// pushed commit for `dst`, then add `dst` to the manifest.
pub fn push_ref<O, C, T>(remote: &Remote<O, C, T>, src: &str, dst: &str) -> Result<PushOutcome>
where
    O: ObjectStore,
    C: ContentStore,
    T: Tracker,
{
    let head = remote
        .objects
        .peel_reference(src)
        .with_context(|| format!("Could not resolve {}", src))?;

    let mut ctx = PushContext::new(remote.progress);
    PushEngine::new(&remote.objects, &remote.store, &remote.tracker).push(head, &mut ctx)?;
    tracing::debug!(
        "Transferred {}/{} objects for {}",
        ctx.completed(),
        ctx.discovered(),
        dst
    );

    remote.tracker.set_slot(dst, head.as_bytes())?;

    let head_cid = expected_cid(&head)?;
    let manifest_cid = ManifestBuilder::new(&remote.store, &remote.tracker).update(dst, &head_cid)?;

    Ok(PushOutcome {
        head,
        head_cid,
        manifest_cid,
    })
}
