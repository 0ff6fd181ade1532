//! Navigation shell for trellis.
//!
//! The [`Shell`] keeps the logical navigation state of an application: a
//! main stack of pages with the root at the bottom, and a modal stack
//! presented over it. Every change is announced with a cancellable
//! [`NavigatingEventArgs`] before anything moves and confirmed with a
//! [`NavigatedEventArgs`] once the platform adapter finished the native
//! transition.
//!
//! Platform adapters implement [`PlatformNavigator`] and report native
//! dismissals and back button presses through the [`PlatformBridge`] they
//! get from [`Shell::platform_bridge`].
//!
//! ```
//! use trellis_shell::{NavigationOutcome, Page, Shell};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let shell = Shell::new(Page::with_route("main"));
//! let detail = Page::with_route("detail").titled("Detail");
//!
//! assert_eq!(shell.push(detail, true).await, Ok(NavigationOutcome::Completed));
//! assert_eq!(shell.current_state().location(), "//main/detail");
//! # });
//! ```
#![deny(missing_docs, clippy::unwrap_used)]

mod detached;
mod error;
pub mod event;
pub mod page;
pub mod platform;
pub mod route;
mod shell;
mod tokio_runtime;

pub use crate::{
    error::{NavigationError, PlatformError, RouteError},
    event::{
        NavigatedEventArgs, NavigatingEventArgs, NavigationDeferral, NavigationOutcome,
        NavigationPhase, NavigationSource, NavigationState,
    },
    page::{BackButtonBehavior, Page, PageId, PageRef, PresentationMode},
    platform::{PlatformBridge, PlatformNavigator, Transition, TransitionKind},
    route::RouteTable,
    shell::{CURRENT_PAGE, CURRENT_STATE, MODAL_DEPTH, Shell, ShellBuilder, ShellConfig},
};
pub use trellis_property::Subscription;
