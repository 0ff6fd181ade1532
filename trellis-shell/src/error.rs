use thiserror::Error;

/// A platform adapter failed to carry out a native transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("platform transition failed: {message}")]
pub struct PlatformError {
    message: String,
}

impl PlatformError {
    /// Create an error with a human readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The adapter's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by shell navigation operations.
///
/// A cancelled navigation is not an error; see
/// [`NavigationOutcome::Cancelled`](crate::NavigationOutcome::Cancelled).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Pop requested while only the root page remains.
    #[error("cannot pop the root page")]
    EmptyStack,
    /// Modal pop requested while no modal is presented.
    #[error("no modal page is presented")]
    NoModal,
    /// The referenced page is not part of the navigation stack.
    #[error("page is not part of the navigation stack")]
    PageNotFound,
    /// The page is already presented by this shell.
    #[error("page is already part of the navigation stack")]
    PageAlreadyPresent,
    /// The root page and the visible top page cannot be removed in place.
    #[error("the root page and the current page cannot be removed")]
    InvalidRemoval,
    /// Pages cannot be inserted below the root page.
    #[error("cannot insert a page before the root page")]
    InvalidInsertion,
    /// No route is registered under this name.
    #[error("no route registered for `{0}`")]
    UnknownRoute(String),
    /// The route string is malformed.
    #[error("malformed route `{0}`")]
    InvalidRoute(String),
    /// The shell behind a platform bridge has been dropped.
    #[error("the shell has been dropped")]
    ShellDropped,
    /// The platform adapter failed; the stacks are unchanged.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors returned when registering routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A route with this name already exists.
    #[error("route `{0}` is already registered")]
    DuplicateRoute(String),
    /// The route name is empty, reserved, or contains invalid characters.
    #[error("invalid route name `{0}`")]
    InvalidRoute(String),
}
