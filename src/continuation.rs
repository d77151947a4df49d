//! Suspended-continuation registry.
//!
//! A handler that reaches a point requiring an external confirmation
//! (typically a services authentication round trip) parks a one-shot
//! resume closure here, keyed by the identity the confirmation is about,
//! and returns its turn instead of blocking the worker. Whatever dispatch
//! path later learns the outcome takes the closure and drives it forward
//! in its own execution context.
//!
//! No timeout is imposed here: a confirmation that never arrives leaves
//! the continuation pending forever. Callers that need bounded waiting
//! wrap the registration themselves.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::ContinuationError;

/// One-shot closure driven with the confirmation outcome.
pub type Resume = Box<dyn FnOnce(bool) -> BoxFuture<'static, ()> + Send>;

/// Pending continuations keyed by identity.
#[derive(Default)]
pub struct ContinuationRegistry {
    pending: Mutex<HashMap<String, Resume>>,
}

impl ContinuationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a continuation for `key`.
    ///
    /// A still-pending continuation under the same key is replaced: a
    /// re-requested confirmation supersedes the stale one, which can no
    /// longer be resumed.
    pub fn register(&self, key: impl Into<String>, resume: Resume) {
        let key = key.into();
        if self.pending.lock().insert(key.clone(), resume).is_some() {
            warn!(key = %key, "replaced pending continuation");
        }
    }

    /// Take the continuation for `key`, removing it from the registry.
    ///
    /// The removal is what makes continuations one-shot: a second take for
    /// the same key fails with [`ContinuationError::NotPending`].
    pub fn take(&self, key: &str) -> Result<Resume, ContinuationError> {
        self.pending
            .lock()
            .remove(key)
            .ok_or_else(|| ContinuationError::NotPending(key.to_string()))
    }

    /// Resume the continuation for `key` with the confirmation outcome,
    /// running it to completion (or to its next suspension) in the calling
    /// context.
    pub async fn resume(&self, key: &str, confirmed: bool) -> Result<(), ContinuationError> {
        let resume = self.take(key)?;
        resume(confirmed).await;
        Ok(())
    }

    /// Whether a continuation is pending for `key`.
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_resume(counter: Arc<AtomicUsize>) -> Resume {
        Box::new(move |confirmed| {
            Box::pin(async move {
                if confirmed {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
    }

    #[tokio::test]
    async fn resume_is_one_shot() {
        let registry = ContinuationRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.register("alice", counting_resume(counter.clone()));
        assert!(registry.is_pending("alice"));

        registry.resume("alice", true).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!registry.is_pending("alice"));

        // Second resume is misuse; the resumed logic does not run again.
        let err = registry.resume("alice", true).await.unwrap_err();
        assert!(matches!(err, ContinuationError::NotPending(key) if key == "alice"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resume_unknown_key_is_reported() {
        let registry = ContinuationRegistry::new();
        assert!(registry.resume("nobody", false).await.is_err());
    }

    #[tokio::test]
    async fn register_replaces_pending_key() {
        let registry = ContinuationRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        registry.register("alice", counting_resume(first.clone()));
        registry.register("alice", counting_resume(second.clone()));

        registry.resume("alice", true).await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resume_passes_outcome() {
        let registry = ContinuationRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.register("bob", counting_resume(counter.clone()));
        registry.resume("bob", false).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
