//! Seams between the shell and a platform adapter.
//!
//! The shell drives native transitions through [`PlatformNavigator`]. The
//! adapter reports what the user did natively (swipe-to-dismiss, back
//! button) through the [`PlatformBridge`] it received from
//! [`Shell::platform_bridge`](crate::Shell::platform_bridge).

use std::sync::{Arc, Weak};

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::{
    error::{NavigationError, PlatformError},
    event::{NavigationOutcome, NavigationSource},
    page::{Page, PageId, PageRef},
    shell::{Shell, ShellInner},
};

/// Mechanical change the adapter has to perform.
#[derive(Clone, Debug)]
pub enum TransitionKind {
    /// Show `page` on top of the main stack.
    Push(PageRef),
    /// Remove `page` from the top of the main stack.
    Pop(PageRef),
    /// Remove these pages (top first), leaving the root.
    PopToRoot(Vec<PageRef>),
    /// Present `page` modally.
    PushModal(PageRef),
    /// Dismiss the top modal `page`.
    PopModal(PageRef),
    /// Insert `page` below `before` without changing the visible page.
    Insert {
        /// Page to insert.
        page: PageRef,
        /// Page that ends up directly above it.
        before: PageId,
    },
    /// Remove a page below the top without changing the visible page.
    Remove(PageRef),
    /// Replace both stacks with these, bottom first.
    Route {
        /// Resulting main stack.
        main: Vec<PageRef>,
        /// Resulting modal stack.
        modal: Vec<PageRef>,
    },
}

/// A transition request sent to the platform adapter.
#[derive(Clone, Debug)]
pub struct Transition {
    /// Source reported with the surrounding events.
    pub source: NavigationSource,
    /// Whether the adapter should animate.
    pub animated: bool,
    /// What to change.
    pub kind: TransitionKind,
}

/// Platform adapter that performs native transitions.
///
/// The returned future resolves once the native transition finished. The
/// shell does not mutate its stacks until then, and leaves them untouched
/// when the future fails.
pub trait PlatformNavigator: Send + Sync {
    /// Carry out `transition`.
    fn transition(&self, transition: Transition) -> BoxFuture<'static, Result<(), PlatformError>>;
}

/// Capability handle given to platform adapters.
///
/// Holds the shell weakly; once the shell is dropped every call becomes a
/// no-op or fails with [`NavigationError::ShellDropped`].
#[derive(Clone)]
pub struct PlatformBridge {
    shell: Weak<ShellInner>,
}

impl PlatformBridge {
    pub(crate) fn new(shell: &Arc<ShellInner>) -> Self {
        Self {
            shell: Arc::downgrade(shell),
        }
    }

    fn shell(&self) -> Result<Shell, NavigationError> {
        self.shell
            .upgrade()
            .map(Shell::from_inner)
            .ok_or(NavigationError::ShellDropped)
    }

    /// Whether the shell is still alive.
    pub fn is_attached(&self) -> bool {
        self.shell.strong_count() > 0
    }

    /// Report that the platform removed a modal page on its own.
    ///
    /// `page` may be the presented modal or any page nested inside it. The
    /// matching modal entry and every modal above it are removed at once.
    /// Returns `false`, without firing events, when the shell does not
    /// present `page`.
    pub fn did_dismiss(&self, page: &Page) -> bool {
        match self.shell() {
            Ok(shell) => shell.dismiss_native(page),
            Err(_) => false,
        }
    }

    /// Report a back button press and wait for the resulting navigation.
    pub async fn send_pop(&self) -> Result<NavigationOutcome, NavigationError> {
        self.shell()?.back_button_pressed().await
    }

    /// Report a back button press from a thread that cannot wait.
    ///
    /// The navigation runs on the ambient tokio runtime, or on a fallback
    /// runtime when there is none. It is abandoned once the application drops
    /// its last [`Shell`] handle, even while a transition is in flight.
    pub fn send_pop_detached(&self) {
        let Ok(shell) = self.shell() else {
            debug!("back button ignored: shell dropped");
            return;
        };
        let bridge = self.clone();
        let spawned = shell.inner.tasks.spawn(async move {
            match bridge.send_pop().await {
                Ok(outcome) => debug!(?outcome, "back button handled"),
                Err(err) => warn!(%err, "back button navigation failed"),
            }
        });
        if !spawned {
            debug!("back button ignored: shell is shutting down");
        }
    }

    /// Main stack snapshot, bottom first. Empty once the shell is dropped.
    pub fn navigation_stack(&self) -> Vec<PageRef> {
        self.shell()
            .map(|shell| shell.navigation_stack())
            .unwrap_or_default()
    }

    /// Modal stack snapshot, bottom first. Empty once the shell is dropped.
    pub fn modal_stack(&self) -> Vec<PageRef> {
        self.shell()
            .map(|shell| shell.modal_stack())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for PlatformBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformBridge")
            .field("attached", &self.is_attached())
            .finish()
    }
}
