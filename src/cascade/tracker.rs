//! Per-level cancellation of in-flight fetches.
//!
//! Starting a fetch for a level cancels the previous one for that level.
//! Every token is a child of one root token, so dropping the tracker stops
//! all outstanding fetches at once.

use crate::region::Level;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub(crate) struct FetchTracker {
    root: CancellationToken,
    active: [Option<CancellationToken>; 4],
}

impl FetchTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a new fetch for `level`, superseding any previous one.
    pub(crate) fn start(&mut self, level: Level) -> CancellationToken {
        let token = self.root.child_token();
        if let Some(previous) = self.active[level.index()].replace(token.clone()) {
            previous.cancel();
            log::trace!(
                target: "wilayah::cascade",
                "Superseded in-flight {} fetch",
                level
            );
        }
        token
    }

    pub(crate) fn cancel(&mut self, level: Level) {
        if let Some(token) = self.active[level.index()].take() {
            token.cancel();
        }
    }
}

impl Drop for FetchTracker {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
