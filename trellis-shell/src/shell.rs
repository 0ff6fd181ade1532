//! The navigation state machine.
//!
//! A [`Shell`] owns a main stack (root page at the bottom) and a modal stack
//! presented over it. Every change runs the same protocol:
//!
//! 1. wait for earlier requests (one FIFO gate per shell),
//! 2. plan the change against a snapshot of the stacks,
//! 3. fire Navigating and wait for deferrals; a cancel stops here,
//! 4. let the platform adapter perform the native transition,
//! 5. apply the planned edits to the live stacks, publish the shell
//!    properties and fire Navigated.
//!
//! Native dismissals reported through the [`PlatformBridge`] skip the gate:
//! they already happened on screen and are applied immediately.

use std::sync::{Arc, LazyLock, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};
use trellis_property::{Bindable, BindableProperty, HandlerList, PropertyStore, Subscription};

use crate::{
    detached::DetachedTasks,
    error::NavigationError,
    event::{
        NavigatedEventArgs, NavigatingEventArgs, NavigationOutcome, NavigationPhase,
        NavigationSource, NavigationState,
    },
    page::{Page, PageRef},
    platform::{PlatformBridge, PlatformNavigator, Transition, TransitionKind},
    route::{RoutePath, RouteSegment, RouteTable},
};

mod builder;
mod state;

pub use builder::{ShellBuilder, ShellConfig};
use state::{ShellState, StackEdit, Stacks, dominant_source};

/// Page currently shown: the top modal, else the top of the main stack.
pub static CURRENT_PAGE: LazyLock<BindableProperty<Shell, Option<PageRef>>> = LazyLock::new(|| {
    BindableProperty::<Shell, Option<PageRef>>::declare("CurrentPage", None)
        .expect("CurrentPage is declared once")
});

/// Location of the shell after the last committed navigation.
pub static CURRENT_STATE: LazyLock<BindableProperty<Shell, NavigationState>> =
    LazyLock::new(|| {
        BindableProperty::<Shell, NavigationState>::declare(
            "CurrentState",
            NavigationState::default(),
        )
        .expect("CurrentState is declared once")
    });

/// Number of presented modal pages.
pub static MODAL_DEPTH: LazyLock<BindableProperty<Shell, usize>> = LazyLock::new(|| {
    BindableProperty::<Shell, usize>::declare("ModalDepth", 0)
        .expect("ModalDepth is declared once")
});

/// A planned navigation, computed before any event fires.
struct Plan {
    source: NavigationSource,
    animated: bool,
    kind: TransitionKind,
    edits: Vec<StackEdit>,
}

pub(crate) struct ShellInner {
    properties: PropertyStore,
    config: ShellConfig,
    routes: RouteTable,
    state: Mutex<ShellState>,
    gate: tokio::sync::Mutex<()>,
    navigating: HandlerList<NavigatingEventArgs>,
    navigated: HandlerList<NavigatedEventArgs>,
    platform: RwLock<Option<Arc<dyn PlatformNavigator>>>,
    pub(crate) tasks: DetachedTasks,
}

impl Drop for ShellInner {
    fn drop(&mut self) {
        self.tasks.close();
    }
}

/// Shared by the application-facing handles of one shell. Dropping the last
/// one closes the shell's detached tasks, even while they hold the shell.
struct OwnerLease {
    inner: Weak<ShellInner>,
}

impl Drop for OwnerLease {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.tasks.close();
        }
    }
}

/// Returns the phase to `Idle` when a pending navigation ends, including
/// when its future is dropped midway.
struct PendingPhase<'a> {
    state: &'a Mutex<ShellState>,
    settled: bool,
}

impl<'a> PendingPhase<'a> {
    fn enter(state: &'a Mutex<ShellState>) -> Self {
        state.lock().phase = NavigationPhase::NavigationPending;
        Self {
            state,
            settled: false,
        }
    }
}

impl Drop for PendingPhase<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("navigation abandoned after Navigating");
        }
        self.state.lock().phase = NavigationPhase::Idle;
    }
}

/// Navigation shell: page stacks, modal presentation and route navigation.
///
/// Cloning is cheap and yields a handle to the same shell.
#[derive(Clone)]
pub struct Shell {
    pub(crate) inner: Arc<ShellInner>,
    owner: Option<Arc<OwnerLease>>,
}

impl Bindable for Shell {
    fn property_store(&self) -> &PropertyStore {
        &self.inner.properties
    }
}

impl Shell {
    /// Shell with `root` as its only page and default settings.
    pub fn new(root: PageRef) -> Self {
        Self::builder(root).build()
    }

    /// Start configuring a shell rooted at `root`.
    pub fn builder(root: PageRef) -> ShellBuilder {
        ShellBuilder::new(root)
    }

    pub(crate) fn from_parts(
        root: PageRef,
        routes: RouteTable,
        config: ShellConfig,
        platform: Option<Arc<dyn PlatformNavigator>>,
    ) -> Self {
        let inner = Arc::new(ShellInner {
            properties: PropertyStore::new(),
            config,
            routes,
            state: Mutex::new(ShellState::new(root)),
            gate: tokio::sync::Mutex::new(()),
            navigating: HandlerList::new(),
            navigated: HandlerList::new(),
            platform: RwLock::new(platform),
            tasks: DetachedTasks::default(),
        });
        let shell = Self {
            owner: Some(Arc::new(OwnerLease {
                inner: Arc::downgrade(&inner),
            })),
            inner,
        };
        let stacks = shell.snapshot();
        shell.publish(&stacks, &stacks.location(&shell.inner.config));
        shell
    }

    /// Handle for the platform side. It does not keep detached tasks alive.
    pub(crate) fn from_inner(inner: Arc<ShellInner>) -> Self {
        Self { inner, owner: None }
    }

    /// Capability handle for the platform adapter.
    pub fn platform_bridge(&self) -> PlatformBridge {
        PlatformBridge::new(&self.inner)
    }

    /// Replace the platform adapter. Takes effect for the next transition.
    pub fn attach_platform(&self, navigator: Arc<dyn PlatformNavigator>) {
        *self.inner.platform.write() = Some(navigator);
    }

    /// Remove the platform adapter; transitions then complete immediately.
    pub fn detach_platform(&self) {
        self.inner.platform.write().take();
    }

    /// Behavior switches this shell was built with.
    pub fn config(&self) -> &ShellConfig {
        &self.inner.config
    }

    /// Observe Navigating. Handlers may cancel or defer the transition.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn on_navigating<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&NavigatingEventArgs) + Send + Sync + 'static,
    {
        self.inner.navigating.subscribe(handler)
    }

    /// Observe Navigated.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn on_navigated<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&NavigatedEventArgs) + Send + Sync + 'static,
    {
        self.inner.navigated.subscribe(handler)
    }

    /// Push `page` on the main stack.
    #[tracing::instrument(level = "debug", skip(self, page), fields(page = %page.id()))]
    pub async fn push(
        &self,
        page: PageRef,
        animated: bool,
    ) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(|stacks| {
            if stacks.contains(page.id()) {
                return Err(NavigationError::PageAlreadyPresent);
            }
            Ok(Some(Plan {
                source: NavigationSource::Push,
                animated,
                kind: TransitionKind::Push(page.clone()),
                edits: vec![StackEdit::PushMain(page.clone())],
            }))
        })
        .await
    }

    /// Pop the top of the main stack.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn pop(&self, animated: bool) -> Result<NavigationOutcome, NavigationError> {
        let config = &self.inner.config;
        self.navigate(|stacks| {
            if stacks.main.len() <= 1 {
                return Err(NavigationError::EmptyStack);
            }
            let top = stacks.main_top().clone();
            let source = if stacks.main.len() == 2 && config.pop_to_root_on_last_pop {
                NavigationSource::PopToRoot
            } else {
                NavigationSource::Pop
            };
            Ok(Some(Plan {
                source,
                animated,
                edits: vec![StackEdit::RemoveMain(top.id())],
                kind: TransitionKind::Pop(top),
            }))
        })
        .await
    }

    /// Pop every main stack page above the root in one transition.
    ///
    /// Completes without events when only the root is left. Modal pages are
    /// not affected.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn pop_to_root(&self, animated: bool) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(|stacks| {
            if stacks.main.len() <= 1 {
                return Ok(None);
            }
            let removed: Vec<PageRef> = stacks.main[1..].iter().rev().cloned().collect();
            Ok(Some(Plan {
                source: NavigationSource::PopToRoot,
                animated,
                edits: removed
                    .iter()
                    .map(|page| StackEdit::RemoveMain(page.id()))
                    .collect(),
                kind: TransitionKind::PopToRoot(removed),
            }))
        })
        .await
    }

    /// Present `page` modally.
    #[tracing::instrument(level = "debug", skip(self, page), fields(page = %page.id()))]
    pub async fn push_modal(
        &self,
        page: PageRef,
        animated: bool,
    ) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(|stacks| {
            if stacks.contains(page.id()) {
                return Err(NavigationError::PageAlreadyPresent);
            }
            Ok(Some(Plan {
                source: NavigationSource::Push,
                animated,
                kind: TransitionKind::PushModal(page.clone()),
                edits: vec![StackEdit::PushModal(page.clone())],
            }))
        })
        .await
    }

    /// Dismiss the top modal page.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn pop_modal(&self, animated: bool) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(|stacks| {
            let top = stacks.modal.last().ok_or(NavigationError::NoModal)?.clone();
            Ok(Some(Plan {
                source: NavigationSource::Pop,
                animated,
                edits: vec![StackEdit::RemoveModal(top.id())],
                kind: TransitionKind::PopModal(top),
            }))
        })
        .await
    }

    /// Insert `page` into the main stack directly below `before`.
    #[tracing::instrument(level = "debug", skip_all, fields(page = %page.id(), before = %before.id()))]
    pub async fn insert_page_before(
        &self,
        page: PageRef,
        before: &Page,
    ) -> Result<NavigationOutcome, NavigationError> {
        let before = before.id();
        self.navigate(|stacks| {
            if stacks.contains(page.id()) {
                return Err(NavigationError::PageAlreadyPresent);
            }
            match stacks.main_index(before) {
                None => Err(NavigationError::PageNotFound),
                Some(0) => Err(NavigationError::InvalidInsertion),
                Some(_) => Ok(Some(Plan {
                    source: NavigationSource::Insert,
                    animated: false,
                    kind: TransitionKind::Insert {
                        page: page.clone(),
                        before,
                    },
                    edits: vec![StackEdit::InsertMain {
                        page: page.clone(),
                        before,
                    }],
                })),
            }
        })
        .await
    }

    /// Remove `page` from the middle of the main stack.
    ///
    /// The root and the top page cannot be removed this way.
    #[tracing::instrument(level = "debug", skip_all, fields(page = %page.id()))]
    pub async fn remove_page(&self, page: &Page) -> Result<NavigationOutcome, NavigationError> {
        let id = page.id();
        self.navigate(|stacks| {
            let index = stacks
                .main_index(id)
                .ok_or(NavigationError::PageNotFound)?;
            if index == 0 || index + 1 == stacks.main.len() {
                return Err(NavigationError::InvalidRemoval);
            }
            let page = stacks.main[index].clone();
            Ok(Some(Plan {
                source: NavigationSource::Remove,
                animated: false,
                kind: TransitionKind::Remove(page),
                edits: vec![StackEdit::RemoveMain(id)],
            }))
        })
        .await
    }

    /// Navigate along `route`, resolved through the shell's route table.
    ///
    /// All segments are applied as one transition with one event pair. The
    /// animation flag of the last pushed page's presentation mode wins.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn go_to(
        &self,
        route: &str,
        animated: bool,
    ) -> Result<NavigationOutcome, NavigationError> {
        let path = RoutePath::parse(route)?;
        let routes = &self.inner.routes;
        let config = &self.inner.config;
        self.navigate(|stacks| {
            let mut target = stacks.clone();
            let mut segments = path.segments.iter();
            if path.absolute {
                let Some(RouteSegment::Named(root)) = segments.next() else {
                    return Err(NavigationError::InvalidRoute(route.to_owned()));
                };
                if stacks.root().route() != Some(root.as_str()) {
                    return Err(NavigationError::UnknownRoute(root.clone()));
                }
                target.main.truncate(1);
                target.modal.clear();
            }

            let mut resolved_animation = animated;
            for segment in segments {
                match segment {
                    RouteSegment::Parent => {
                        if target.modal.pop().is_none() {
                            if target.main.len() <= 1 {
                                return Err(NavigationError::EmptyStack);
                            }
                            target.main.pop();
                        }
                    }
                    RouteSegment::Named(name) => {
                        let page = routes.create(name)?;
                        let mode = page.presentation_mode();
                        resolved_animation = mode.animated(animated);
                        if mode.is_modal() {
                            target.modal.push(page);
                        } else {
                            target.main.push(page);
                        }
                    }
                }
            }

            if target.same_pages(stacks) {
                return Ok(None);
            }
            let source = dominant_source(stacks, &target, config);
            let edits = stacks.edits_to(&target);
            Ok(Some(Plan {
                source,
                animated: resolved_animation,
                edits,
                kind: TransitionKind::Route {
                    main: target.main,
                    modal: target.modal,
                },
            }))
        })
        .await
    }

    /// Main stack snapshot, bottom first.
    pub fn navigation_stack(&self) -> Vec<PageRef> {
        self.inner.state.lock().stacks.main.clone()
    }

    /// Modal stack snapshot, bottom first.
    pub fn modal_stack(&self) -> Vec<PageRef> {
        self.inner.state.lock().stacks.modal.clone()
    }

    /// Page currently shown: the top modal, else the top of the main stack.
    pub fn current_page(&self) -> PageRef {
        self.inner.state.lock().stacks.current_page().clone()
    }

    /// Location of the live stacks.
    pub fn current_state(&self) -> NavigationState {
        self.snapshot().location(&self.inner.config)
    }

    /// Where the navigation machinery is.
    pub fn phase(&self) -> NavigationPhase {
        self.inner.state.lock().phase
    }

    /// Text of the back button for the top of the main stack.
    ///
    /// The top page's override wins; otherwise the previous page's title.
    /// `None` at the root or when the previous page has no title.
    pub fn back_button_text(&self) -> Option<String> {
        let (top, previous) = {
            let state = self.inner.state.lock();
            let main = &state.stacks.main;
            if main.len() < 2 {
                return None;
            }
            (main[main.len() - 1].clone(), main[main.len() - 2].clone())
        };
        if let Some(text) = top.back_button_behavior().text_override {
            return Some(text);
        }
        Some(previous.title()).filter(|title| !title.is_empty())
    }

    /// Whether the back button is shown for the top of the main stack.
    pub fn is_back_button_visible(&self) -> bool {
        let top = {
            let state = self.inner.state.lock();
            if state.stacks.main.len() < 2 {
                return false;
            }
            state.stacks.main_top().clone()
        };
        top.back_button_behavior().is_visible
    }

    pub(crate) async fn back_button_pressed(&self) -> Result<NavigationOutcome, NavigationError> {
        let top = self.inner.state.lock().stacks.main_top().clone();
        let behavior = top.back_button_behavior();
        if !behavior.is_enabled {
            debug!(page = %top.id(), "back button disabled");
            return Ok(NavigationOutcome::Intercepted);
        }
        if let Some(command) = behavior.command {
            debug!(page = %top.id(), "back button command");
            command.call();
            return Ok(NavigationOutcome::Intercepted);
        }
        self.pop(true).await
    }

    /// Reconcile a modal dismissal that already happened natively.
    pub(crate) fn dismiss_native(&self, page: &Page) -> bool {
        let (before, phase, edits) = {
            let state = self.inner.state.lock();
            let Some(index) = state.stacks.modal_index_containing(page.id()) else {
                trace!(page = %page.id(), "dismissed page is not presented");
                return false;
            };
            let edits: Vec<StackEdit> = state.stacks.modal[index..]
                .iter()
                .rev()
                .map(|entry| StackEdit::RemoveModal(entry.id()))
                .collect();
            (state.stacks.clone(), state.phase, edits)
        };
        debug!(page = %page.id(), removed = edits.len(), "native modal dismissal");

        let config = &self.inner.config;
        let current = before.location(config);
        let target = before.with_edits(&edits).location(config);
        let args =
            NavigatingEventArgs::new(current.clone(), target, NavigationSource::PopToRoot, false);
        self.inner.navigating.emit(&args);

        self.commit(&edits, current, NavigationSource::PopToRoot);
        self.inner.state.lock().phase = phase;
        true
    }

    async fn navigate<F>(&self, plan: F) -> Result<NavigationOutcome, NavigationError>
    where
        F: FnOnce(&Stacks) -> Result<Option<Plan>, NavigationError>,
    {
        let _gate = self.inner.gate.lock().await;
        let before = self.snapshot();
        let Some(plan) = plan(&before)? else {
            trace!("nothing to navigate");
            return Ok(NavigationOutcome::Completed);
        };

        let config = &self.inner.config;
        let current = before.location(config);
        let target = before.with_edits(&plan.edits).location(config);
        let mut pending = PendingPhase::enter(&self.inner.state);

        let args = NavigatingEventArgs::new(current.clone(), target, plan.source, true);
        self.inner.navigating.emit(&args);
        if !args.settle().await {
            debug!(source = ?plan.source, "navigation cancelled");
            pending.settled = true;
            return Ok(NavigationOutcome::Cancelled);
        }

        if let Some(platform) = self.platform() {
            let transition = Transition {
                source: plan.source,
                animated: plan.animated,
                kind: plan.kind,
            };
            if let Err(err) = platform.transition(transition).await {
                warn!(%err, source = ?plan.source, "platform transition failed");
                pending.settled = true;
                return Err(err.into());
            }
        }

        self.commit(&plan.edits, current, plan.source);
        pending.settled = true;
        Ok(NavigationOutcome::Completed)
    }

    /// Apply `edits`, publish the new state and fire Navigated.
    fn commit(&self, edits: &[StackEdit], previous: NavigationState, source: NavigationSource) {
        let after = {
            let mut state = self.inner.state.lock();
            state.stacks.apply_all(edits);
            state.phase = NavigationPhase::Navigated;
            state.stacks.clone()
        };
        let current = after.location(&self.inner.config);
        debug!(%previous, %current, ?source, "navigated");
        self.publish(&after, &current);
        self.inner
            .navigated
            .emit(&NavigatedEventArgs::new(previous, current, source));
    }

    fn publish(&self, stacks: &Stacks, state: &NavigationState) {
        let results = [
            CURRENT_PAGE.set(self, Some(stacks.current_page().clone())),
            CURRENT_STATE.set(self, state.clone()),
            MODAL_DEPTH.set(self, stacks.modal.len()),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            warn!(%err, "shell property rejected");
        }
    }

    fn snapshot(&self) -> Stacks {
        self.inner.state.lock().stacks.clone()
    }

    fn platform(&self) -> Option<Arc<dyn PlatformNavigator>> {
        self.inner.platform.read().clone()
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Shell")
            .field("main", &state.stacks.main.len())
            .field("modal", &state.stacks.modal.len())
            .field("phase", &state.phase)
            .finish()
    }
}
