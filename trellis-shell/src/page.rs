//! Pages and the per-page navigation properties.

use std::{
    fmt,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::warn;
use trellis_property::{Bindable, BindableProperty, Callback, PropertyStore};

static NEXT_PAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier for one page instance.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PageId(u64);

impl PageId {
    fn new() -> Self {
        Self(NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared page handle, as held by navigation stacks.
pub type PageRef = Arc<Page>;

/// How a page is presented when it is reached through a route.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum PresentationMode {
    /// Pushed on the main stack, animation chosen by the caller.
    #[default]
    Animated,
    /// Pushed on the main stack without animation.
    NotAnimated,
    /// Presented modally, animation chosen by the caller.
    Modal,
    /// Presented modally with animation.
    ModalAnimated,
    /// Presented modally without animation.
    ModalNotAnimated,
}

impl PresentationMode {
    /// Whether the page goes on the modal stack.
    pub fn is_modal(self) -> bool {
        matches!(
            self,
            Self::Modal | Self::ModalAnimated | Self::ModalNotAnimated
        )
    }

    /// Resolve the animation flag for a transition requested with `requested`.
    pub fn animated(self, requested: bool) -> bool {
        match self {
            Self::NotAnimated | Self::ModalNotAnimated => false,
            Self::ModalAnimated => true,
            Self::Animated | Self::Modal => requested,
        }
    }
}

/// Per-page override of the back button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackButtonBehavior {
    /// Text shown instead of the previous page's title.
    pub text_override: Option<String>,
    /// Whether the back button is shown at all.
    pub is_visible: bool,
    /// Whether pressing the back button does anything.
    pub is_enabled: bool,
    /// Runs instead of popping when set.
    pub command: Option<Callback>,
}

impl Default for BackButtonBehavior {
    fn default() -> Self {
        Self {
            text_override: None,
            is_visible: true,
            is_enabled: true,
            command: None,
        }
    }
}

impl BackButtonBehavior {
    /// Behavior that only overrides the back button text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text_override: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Page title, also used as the default back button text of the next page.
pub static TITLE: LazyLock<BindableProperty<Page, String>> = LazyLock::new(|| {
    BindableProperty::<Page, String>::declare("Title", String::new())
        .expect("Title is declared once")
});

/// Back button behavior shown while this page is on top.
pub static BACK_BUTTON_BEHAVIOR: LazyLock<BindableProperty<Page, BackButtonBehavior>> =
    LazyLock::new(|| {
        BindableProperty::<Page, BackButtonBehavior>::declare(
            "BackButtonBehavior",
            BackButtonBehavior::default(),
        )
        .expect("BackButtonBehavior is declared once")
    });

/// Presentation used when the page is reached through a route.
pub static PRESENTATION_MODE: LazyLock<BindableProperty<Page, PresentationMode>> =
    LazyLock::new(|| {
        BindableProperty::<Page, PresentationMode>::declare(
            "PresentationMode",
            PresentationMode::default(),
        )
        .expect("PresentationMode is declared once")
    });

/// One logical page.
///
/// A container page wraps its own ordered list of nested pages (a navigation
/// page presented modally, for example). The shell treats a container as a
/// single unit: dismissing it dismisses everything inside.
pub struct Page {
    id: PageId,
    route: Option<String>,
    nested: Vec<PageRef>,
    properties: PropertyStore,
}

impl Page {
    /// Create a page without a route.
    pub fn new() -> PageRef {
        Self::build(None, Vec::new())
    }

    /// Create a page reachable through `route`.
    pub fn with_route(route: impl Into<String>) -> PageRef {
        Self::build(Some(route.into()), Vec::new())
    }

    /// Create a container page holding `nested`, bottom first.
    pub fn container(nested: Vec<PageRef>) -> PageRef {
        Self::build(None, nested)
    }

    fn build(route: Option<String>, nested: Vec<PageRef>) -> PageRef {
        Arc::new(Self {
            id: PageId::new(),
            route,
            nested,
            properties: PropertyStore::new(),
        })
    }

    /// Builder-style title setter.
    pub fn titled(self: PageRef, title: impl Into<String>) -> PageRef {
        self.set_title(title);
        self
    }

    /// Builder-style presentation mode setter.
    pub fn presented(self: PageRef, mode: PresentationMode) -> PageRef {
        self.set_presentation_mode(mode);
        self
    }

    /// Identifier of this page.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Route name, if the page was created for a route.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Nested pages of a container, bottom first. Empty for plain pages.
    pub fn nested_pages(&self) -> &[PageRef] {
        &self.nested
    }

    /// Whether this page is `id` or contains it, at any depth.
    pub fn contains(&self, id: PageId) -> bool {
        self.id == id || self.nested.iter().any(|page| page.contains(id))
    }

    /// Current title.
    pub fn title(&self) -> String {
        TITLE.get(self)
    }

    /// Set the title.
    pub fn set_title(&self, title: impl Into<String>) {
        if let Err(err) = TITLE.set(self, title.into()) {
            warn!(%err, page = %self.id, "title rejected");
        }
    }

    /// Current back button behavior.
    pub fn back_button_behavior(&self) -> BackButtonBehavior {
        BACK_BUTTON_BEHAVIOR.get(self)
    }

    /// Set the back button behavior.
    pub fn set_back_button_behavior(&self, behavior: BackButtonBehavior) {
        if let Err(err) = BACK_BUTTON_BEHAVIOR.set(self, behavior) {
            warn!(%err, page = %self.id, "back button behavior rejected");
        }
    }

    /// Current presentation mode.
    pub fn presentation_mode(&self) -> PresentationMode {
        PRESENTATION_MODE.get(self)
    }

    /// Set the presentation mode.
    pub fn set_presentation_mode(&self, mode: PresentationMode) {
        if let Err(err) = PRESENTATION_MODE.set(self, mode) {
            warn!(%err, page = %self.id, "presentation mode rejected");
        }
    }
}

impl Bindable for Page {
    fn property_store(&self) -> &PropertyStore {
        &self.properties
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Page {}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("route", &self.route)
            .field("nested", &self.nested.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{BackButtonBehavior, Page, PresentationMode};

    #[test]
    fn container_contains_nested_pages() {
        let inner = Page::new();
        let deeper = Page::new();
        let middle = Page::container(vec![deeper.clone()]);
        let container = Page::container(vec![inner.clone(), middle]);

        assert!(container.contains(container.id()));
        assert!(container.contains(inner.id()));
        assert!(container.contains(deeper.id()));
        assert!(!container.contains(Page::new().id()));
        assert_eq!(container.nested_pages().len(), 2);
    }

    #[test]
    fn page_properties_round_through_the_store() {
        let page = Page::with_route("settings")
            .titled("Settings")
            .presented(PresentationMode::ModalAnimated);

        assert_eq!(page.route(), Some("settings"));
        assert_eq!(page.title(), "Settings");
        assert!(page.presentation_mode().is_modal());
        assert_eq!(page.back_button_behavior(), BackButtonBehavior::default());
    }

    #[test]
    fn presentation_mode_resolves_animation() {
        assert!(PresentationMode::Animated.animated(true));
        assert!(!PresentationMode::Animated.animated(false));
        assert!(!PresentationMode::ModalNotAnimated.animated(true));
        assert!(PresentationMode::ModalAnimated.animated(false));
        assert!(!PresentationMode::NotAnimated.is_modal());
    }
}
