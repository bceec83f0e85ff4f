use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::git::ObjectId;

/// Per-invocation push state used for progress reporting only.
///
/// `discovered` counts identities queued (including the root), `completed`
/// counts identities transferred. Neither affects what gets pushed.
pub struct PushContext {
    discovered: u64,
    completed: u64,
    bar: ProgressBar,
}

impl PushContext {
    /// Context drawing a progress line on stderr
    pub fn new(show_progress: bool) -> Self {
        let bar = if show_progress {
            let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::with_template("push: {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            discovered: 0,
            completed: 0,
            bar,
        }
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn discovered(&self) -> u64 {
        self.discovered
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub(super) fn queue(&mut self) {
        self.discovered += 1;
        self.bar.set_length(self.discovered);
    }

    /// A queued identity turned out to be already pushed
    pub(super) fn skip(&mut self) {
        self.discovered = self.discovered.saturating_sub(1);
        self.bar.set_length(self.discovered);
    }

    pub(super) fn complete(&mut self, id: &ObjectId, cid: &cid::Cid) {
        self.completed += 1;
        self.bar.set_position(self.completed);
        self.bar.set_message(format!("{} {}", id, cid));
        tracing::debug!(
            "{}/{} {} {}",
            self.completed,
            self.discovered,
            id,
            cid
        );
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
