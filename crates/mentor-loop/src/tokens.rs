use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// A cancellation token tagged with the run that owns it.
pub(crate) struct Run {
    pub id: u64,
    pub token: CancellationToken,
}

/// At most one live token per session. Starting a run cancels the previous
/// one; a finished run only releases its own entry.
#[derive(Default)]
pub(crate) struct RunTokens {
    tokens: DashMap<String, (u64, CancellationToken)>,
    runs: AtomicU64,
}

impl RunTokens {
    pub fn begin(&self, session_id: &str) -> Run {
        let run = Run {
            id: self.runs.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        };
        if let Some((_, previous)) = self
            .tokens
            .insert(session_id.to_string(), (run.id, run.token.clone()))
        {
            previous.cancel();
        }
        run
    }

    pub fn release(&self, session_id: &str, run: &Run) {
        self.tokens
            .remove_if(session_id, |_, (current, _)| *current == run.id);
    }

    /// Cancels and forgets the session's token. Returns false when nothing
    /// was running.
    pub fn cancel(&self, session_id: &str) -> bool {
        match self.tokens.remove(session_id) {
            Some((_, (_, token))) => {
                let live = !token.is_cancelled();
                token.cancel();
                live
            }
            None => false,
        }
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.tokens
            .get(session_id)
            .map(|entry| !entry.1.is_cancelled())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_cancels_previous_run() {
        let tokens = RunTokens::default();
        let first = tokens.begin("s1");
        let second = tokens.begin("s1");

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());

        // A stale release leaves the newer run registered.
        tokens.release("s1", &first);
        assert!(tokens.is_running("s1"));

        tokens.release("s1", &second);
        assert!(!tokens.is_running("s1"));
    }

    #[test]
    fn cancel_reports_live_runs_only() {
        let tokens = RunTokens::default();
        assert!(!tokens.cancel("s1"));

        let run = tokens.begin("s1");
        assert!(tokens.cancel("s1"));
        assert!(run.token.is_cancelled());
        assert!(!tokens.cancel("s1"));
    }
}
