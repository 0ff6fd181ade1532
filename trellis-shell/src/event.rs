//! Navigation events, states and outcomes.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// What caused a navigation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum NavigationSource {
    /// Mixed or unclassifiable change.
    #[default]
    Unknown,
    /// A page was pushed.
    Push,
    /// A page was popped.
    Pop,
    /// Everything above the root was removed.
    PopToRoot,
    /// A page was inserted below the top.
    Insert,
    /// A page below the top was removed.
    Remove,
}

/// Where the shell currently is, as a route location.
///
/// Locations look like `//root/detail/settings`: the root page's route,
/// then every main stack page above it, then every modal page.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NavigationState {
    location: String,
}

impl NavigationState {
    pub(crate) fn new(location: String) -> Self {
        Self { location }
    }

    /// The location string.
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Lifecycle of the shell's navigation machinery.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum NavigationPhase {
    /// No navigation in progress.
    #[default]
    Idle,
    /// Navigating has fired and the transition has not resolved yet.
    NavigationPending,
    /// Navigated handlers are running. Returns to `Idle` right after.
    Navigated,
}

/// How an accepted navigation request ended.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NavigationOutcome {
    /// The transition ran and Navigated fired (or there was nothing to do).
    Completed,
    /// A Navigating handler cancelled; nothing changed.
    Cancelled,
    /// A back button override handled the request; nothing changed.
    Intercepted,
}

/// Arguments of the pre-flight Navigating event.
pub struct NavigatingEventArgs {
    current: NavigationState,
    target: NavigationState,
    source: NavigationSource,
    can_cancel: bool,
    cancelled: Arc<AtomicBool>,
    deferrals: Mutex<Vec<oneshot::Receiver<()>>>,
}

impl NavigatingEventArgs {
    pub(crate) fn new(
        current: NavigationState,
        target: NavigationState,
        source: NavigationSource,
        can_cancel: bool,
    ) -> Self {
        Self {
            current,
            target,
            source,
            can_cancel,
            cancelled: Arc::new(AtomicBool::new(false)),
            deferrals: Mutex::new(Vec::new()),
        }
    }

    /// State before the transition.
    pub fn current(&self) -> &NavigationState {
        &self.current
    }

    /// State the transition leads to.
    pub fn target(&self) -> &NavigationState {
        &self.target
    }

    /// Predicted source of the transition.
    pub fn source(&self) -> NavigationSource {
        self.source
    }

    /// Whether [`cancel`](Self::cancel) has any effect.
    ///
    /// `false` for native-originated dismissals, which already happened on
    /// screen and can only be caught up with.
    pub fn can_cancel(&self) -> bool {
        self.can_cancel
    }

    /// Abandon the transition. Returns whether the request was accepted.
    pub fn cancel(&self) -> bool {
        if !self.can_cancel {
            debug!(source = ?self.source, "cancel ignored: navigation already happened");
            return false;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        true
    }

    /// Whether a handler cancelled the transition.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Hold the transition open until the returned deferral completes.
    ///
    /// Returns `None` when the transition cannot be cancelled.
    pub fn defer(&self) -> Option<NavigationDeferral> {
        if !self.can_cancel {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        self.deferrals.lock().push(rx);
        Some(NavigationDeferral {
            done: Some(tx),
            cancelled: self.cancelled.clone(),
        })
    }

    /// Wait for outstanding deferrals. Returns `true` when the transition
    /// may proceed.
    pub(crate) async fn settle(&self) -> bool {
        let pending = std::mem::take(&mut *self.deferrals.lock());
        if !pending.is_empty() {
            // A dropped sender counts as completion.
            join_all(pending).await;
        }
        !self.is_cancelled()
    }
}

impl fmt::Debug for NavigatingEventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatingEventArgs")
            .field("current", &self.current)
            .field("target", &self.target)
            .field("source", &self.source)
            .field("can_cancel", &self.can_cancel)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Token that keeps a Navigating transition waiting.
///
/// Completing or dropping the deferral lets the transition continue.
pub struct NavigationDeferral {
    done: Option<oneshot::Sender<()>>,
    cancelled: Arc<AtomicBool>,
}

impl NavigationDeferral {
    /// Let the transition continue.
    pub fn complete(mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }

    /// Cancel the transition and release it.
    pub fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.complete();
    }
}

impl Drop for NavigationDeferral {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

/// Arguments of the post-flight Navigated event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigatedEventArgs {
    previous: NavigationState,
    current: NavigationState,
    source: NavigationSource,
}

impl NavigatedEventArgs {
    pub(crate) fn new(
        previous: NavigationState,
        current: NavigationState,
        source: NavigationSource,
    ) -> Self {
        Self {
            previous,
            current,
            source,
        }
    }

    /// State before the transition.
    pub fn previous(&self) -> &NavigationState {
        &self.previous
    }

    /// State after the transition.
    pub fn current(&self) -> &NavigationState {
        &self.current
    }

    /// Confirmed source of the transition.
    pub fn source(&self) -> NavigationSource {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::{NavigatingEventArgs, NavigationSource, NavigationState};

    fn args(can_cancel: bool) -> NavigatingEventArgs {
        NavigatingEventArgs::new(
            NavigationState::new("//root".to_owned()),
            NavigationState::new("//root/detail".to_owned()),
            NavigationSource::Push,
            can_cancel,
        )
    }

    #[tokio::test]
    async fn cancel_is_ignored_when_not_cancellable() {
        let args = args(false);
        assert!(!args.cancel());
        assert!(args.defer().is_none());
        assert!(args.settle().await);
    }

    #[tokio::test]
    async fn deferral_holds_until_completed() {
        let args = args(true);
        let deferral = args.defer().expect("cancellable");
        let release = tokio::spawn(async move {
            tokio::task::yield_now().await;
            deferral.complete();
        });
        assert!(args.settle().await);
        release.await.expect("release task");
    }

    #[tokio::test]
    async fn deferral_can_cancel() {
        let args = args(true);
        let deferral = args.defer().expect("cancellable");
        deferral.cancel();
        assert!(!args.settle().await);
        assert!(args.is_cancelled());
    }

    #[tokio::test]
    async fn dropped_deferral_counts_as_completion() {
        let args = args(true);
        drop(args.defer());
        assert!(args.settle().await);
    }
}
