use std::sync::Arc;

use crate::{page::PageRef, platform::PlatformNavigator, route::RouteTable, shell::Shell};

/// Shell behavior switches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellConfig {
    /// Tag a pop that leaves only the root page as `PopToRoot`, the way the
    /// back button reports it. When `false` such a pop is tagged `Pop`.
    pub pop_to_root_on_last_pop: bool,
    /// Location segment prefix for pages without a route, followed by `-{id}`.
    pub anonymous_route_prefix: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            pop_to_root_on_last_pop: true,
            anonymous_route_prefix: "page".to_owned(),
        }
    }
}

/// Builder for a [`Shell`].
///
/// # Examples
///
/// ```
/// use trellis_shell::{Page, RouteTable, Shell, ShellConfig};
///
/// let routes = RouteTable::new()
///     .with_route("detail", || Page::with_route("detail"))
///     .expect("valid route");
/// let shell = Shell::builder(Page::with_route("main"))
///     .routes(routes)
///     .config(ShellConfig::default())
///     .build();
/// assert_eq!(shell.current_state().location(), "//main");
/// ```
#[must_use]
pub struct ShellBuilder {
    root: PageRef,
    routes: RouteTable,
    config: ShellConfig,
    platform: Option<Arc<dyn PlatformNavigator>>,
}

impl ShellBuilder {
    pub(crate) fn new(root: PageRef) -> Self {
        Self {
            root,
            routes: RouteTable::default(),
            config: ShellConfig::default(),
            platform: None,
        }
    }

    /// Routes available to [`Shell::go_to`].
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Behavior switches.
    pub fn config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    /// Platform adapter that carries out transitions. Without one, every
    /// transition completes immediately.
    pub fn platform(mut self, navigator: Arc<dyn PlatformNavigator>) -> Self {
        self.platform = Some(navigator);
        self
    }

    /// Build the shell with the root page as its only page.
    pub fn build(self) -> Shell {
        Shell::from_parts(self.root, self.routes, self.config, self.platform)
    }
}
