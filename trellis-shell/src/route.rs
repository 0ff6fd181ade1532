//! Route table and route path parsing.
//!
//! The table is an ordinary value owned by the application and handed to the
//! shell when it is built; there is no process-wide route registry.
//!
//! # Route syntax
//!
//! - `detail` / `detail/edit`: relative, pushes one page per segment.
//! - `..`: pops one page (the top modal first). `../edit` pops then pushes.
//! - `//root/detail`: absolute. The first segment names the root page; both
//!   stacks are reset to the root before the rest is applied.

use std::{collections::HashMap, fmt, sync::Arc};

use smallvec::SmallVec;

use crate::{
    error::{NavigationError, RouteError},
    page::PageRef,
};

type PageFactory = Arc<dyn Fn() -> PageRef + Send + Sync>;

const PARENT_SEGMENT: &str = "..";

/// Named page factories used by [`Shell::go_to`](crate::Shell::go_to).
#[derive(Clone, Default)]
pub struct RouteTable {
    factories: HashMap<String, PageFactory>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `route`.
    pub fn register<F>(&mut self, route: impl Into<String>, factory: F) -> Result<(), RouteError>
    where
        F: Fn() -> PageRef + Send + Sync + 'static,
    {
        let route = route.into();
        if !is_valid_route_name(&route) {
            return Err(RouteError::InvalidRoute(route));
        }
        if self.factories.contains_key(&route) {
            return Err(RouteError::DuplicateRoute(route));
        }
        self.factories.insert(route, Arc::new(factory));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_route<F>(mut self, route: impl Into<String>, factory: F) -> Result<Self, RouteError>
    where
        F: Fn() -> PageRef + Send + Sync + 'static,
    {
        self.register(route, factory)?;
        Ok(self)
    }

    /// Remove a route. Returns whether it existed.
    pub fn unregister(&mut self, route: &str) -> bool {
        self.factories.remove(route).is_some()
    }

    /// Whether `route` is registered.
    pub fn contains(&self, route: &str) -> bool {
        self.factories.contains_key(route)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no route is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the page registered under `route`.
    pub fn create(&self, route: &str) -> Result<PageRef, NavigationError> {
        let factory = self
            .factories
            .get(route)
            .ok_or_else(|| NavigationError::UnknownRoute(route.to_owned()))?;
        Ok(factory())
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<_> = self.factories.keys().collect();
        routes.sort();
        f.debug_struct("RouteTable").field("routes", &routes).finish()
    }
}

fn is_valid_route_name(route: &str) -> bool {
    !route.is_empty()
        && route != PARENT_SEGMENT
        && route
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// One step of a parsed route.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RouteSegment {
    Parent,
    Named(String),
}

/// A parsed route string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct RoutePath {
    pub(crate) absolute: bool,
    pub(crate) segments: SmallVec<[RouteSegment; 4]>,
}

impl RoutePath {
    pub(crate) fn parse(route: &str) -> Result<Self, NavigationError> {
        let invalid = || NavigationError::InvalidRoute(route.to_owned());
        let (absolute, rest) = match route.strip_prefix("//") {
            Some(rest) => (true, rest),
            None => (false, route),
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut segments = SmallVec::new();
        for segment in rest.split('/') {
            if segment == PARENT_SEGMENT {
                if absolute {
                    return Err(invalid());
                }
                segments.push(RouteSegment::Parent);
            } else if is_valid_route_name(segment) {
                segments.push(RouteSegment::Named(segment.to_owned()));
            } else {
                return Err(invalid());
            }
        }
        Ok(Self { absolute, segments })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{NavigationError, RouteError},
        page::Page,
    };

    use super::{RoutePath, RouteSegment, RouteTable};

    #[test]
    fn registration_rejects_duplicates_and_bad_names() {
        let mut routes = RouteTable::new();
        routes.register("detail", Page::new).expect("valid route");
        assert_eq!(
            routes.register("detail", Page::new),
            Err(RouteError::DuplicateRoute("detail".to_owned()))
        );
        assert_eq!(
            routes.register("a/b", Page::new),
            Err(RouteError::InvalidRoute("a/b".to_owned()))
        );
        assert_eq!(
            routes.register("..", Page::new),
            Err(RouteError::InvalidRoute("..".to_owned()))
        );
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn create_builds_a_fresh_page_each_time() {
        let routes = RouteTable::new()
            .with_route("detail", || Page::with_route("detail"))
            .expect("valid route");
        let a = routes.create("detail").expect("registered");
        let b = routes.create("detail").expect("registered");
        assert_ne!(a.id(), b.id());
        assert_eq!(
            routes.create("missing").map(|page| page.id()),
            Err(NavigationError::UnknownRoute("missing".to_owned()))
        );
    }

    #[test]
    fn unregistered_routes_stop_resolving() {
        let mut routes = RouteTable::new()
            .with_route("detail", || Page::with_route("detail"))
            .expect("valid route");
        assert!(routes.contains("detail"));
        assert!(!routes.contains("edit"));

        assert!(routes.unregister("detail"));
        assert!(!routes.contains("detail"));
        assert!(routes.is_empty());
        assert!(!routes.unregister("detail"));
        assert_eq!(
            routes.create("detail").map(|page| page.id()),
            Err(NavigationError::UnknownRoute("detail".to_owned()))
        );

        routes.register("detail", Page::new).expect("name is free again");
        assert!(routes.contains("detail"));
    }

    #[test]
    fn parses_relative_absolute_and_parent_segments() {
        let relative = RoutePath::parse("../detail/edit/").expect("valid");
        assert!(!relative.absolute);
        assert_eq!(
            relative.segments.as_slice(),
            &[
                RouteSegment::Parent,
                RouteSegment::Named("detail".to_owned()),
                RouteSegment::Named("edit".to_owned()),
            ]
        );

        let absolute = RoutePath::parse("//main/detail").expect("valid");
        assert!(absolute.absolute);
        assert_eq!(absolute.segments.len(), 2);
    }

    #[test]
    fn rejects_malformed_routes() {
        for route in ["", "//", "a//b", "//../a", "a b"] {
            assert_eq!(
                RoutePath::parse(route),
                Err(NavigationError::InvalidRoute(route.to_owned())),
                "{route}"
            );
        }
    }
}
