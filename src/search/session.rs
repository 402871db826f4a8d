use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::resolver::{SearchOutcome, SearchResolver};
use super::traits::PropertySource;
use super::types::SearchState;

/// Identifies one submission; only the latest one may commit results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Holds the "latest request" token. Compared by value, never locked.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
}

impl RequestTracker {
    /// Issues a new token, superseding every earlier one
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Debounced, supersedable front of a [`SearchResolver`].
///
/// Completions can arrive out of order, so every submission captures a
/// token up front and drops its outcome if a newer submission was made in
/// the meantime.
pub struct SearchSession<S> {
    resolver: SearchResolver<S>,
    tracker: RequestTracker,
    debounce: Duration,
}

impl<S: PropertySource> SearchSession<S> {
    pub fn new(resolver: SearchResolver<S>, debounce: Duration) -> Self {
        Self {
            resolver,
            tracker: RequestTracker::default(),
            debounce,
        }
    }

    pub fn resolver(&self) -> &SearchResolver<S> {
        &self.resolver
    }

    /// For keystroke-driven input. Waits out the debounce window and returns
    /// `None` without any call if a newer submission arrived; returns `None`
    /// after resolving if the outcome went stale.
    pub async fn submit(&self, state: SearchState) -> Option<SearchOutcome> {
        let token = self.tracker.issue();

        tokio::time::sleep(self.debounce).await;
        if !self.tracker.is_current(token) {
            debug!(?token, "Superseded while debouncing");
            return None;
        }

        self.run(token, &state).await
    }

    /// For explicit submits: resolves immediately, still honouring supersession.
    pub async fn submit_now(&self, state: SearchState) -> Option<SearchOutcome> {
        let token = self.tracker.issue();
        self.run(token, &state).await
    }

    async fn run(&self, token: RequestToken, state: &SearchState) -> Option<SearchOutcome> {
        let outcome = self.resolver.resolve(state).await;
        if !self.tracker.is_current(token) {
            debug!(?token, "Discarding stale search outcome");
            return None;
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::search::query::LocationQuery;
    use crate::search::types::{RadiusPolicy, SearchRequest};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    /// Answers every keyword with one record; "slow" takes a second.
    #[derive(Default)]
    struct EchoSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PropertySource for EchoSource {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let keyword = request.keyword.clone().unwrap_or_default();
            if keyword == "slow" {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Ok(vec![json!({"id": keyword})])
        }

        fn source_name(&self) -> &'static str {
            "echo"
        }
    }

    fn session() -> SearchSession<EchoSource> {
        SearchSession::new(
            SearchResolver::new(EchoSource::default(), RadiusPolicy::default()),
            Duration::from_millis(300),
        )
    }

    fn typed(text: &str) -> SearchState {
        SearchState::new(LocationQuery::from_text(text))
    }

    #[test]
    fn newer_tokens_supersede_older_ones() {
        let tracker = RequestTracker::default();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_the_window_collapse_to_one_call() {
        let session = session();

        let (first, second) = tokio::join!(session.submit(typed("Lis")), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.submit(typed("Lisbon")).await
        });

        assert!(first.is_none());
        let outcome = second.expect("latest submission commits");
        assert_eq!(outcome.properties()[0].id, "Lisbon");
        assert_eq!(session.resolver().source().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_completion_is_discarded() {
        let session = session();

        let (slow, fast) = tokio::join!(session.submit_now(typed("slow")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.submit_now(typed("fast")).await
        });

        assert!(slow.is_none());
        assert_eq!(fast.unwrap().properties()[0].id, "fast");
        assert_eq!(session.resolver().source().calls.load(Ordering::SeqCst), 2);
    }
}
