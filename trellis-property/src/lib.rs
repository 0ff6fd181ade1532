//! Bindable properties for trellis UI elements.
//!
//! Every element owns a [`PropertyStore`] and exposes it through the
//! [`Bindable`] trait. Properties are declared once as shared descriptors
//! ([`BindableProperty`]) and read or written per instance. The store only
//! holds values that were explicitly written; everything else resolves to the
//! descriptor default.
//!
//! # Declaring properties
//!
//! A property is owned by a capability: either a concrete element type or a
//! trait object describing a capability shared by several elements.
//!
//! ```
//! use std::sync::LazyLock;
//!
//! use trellis_property::{Bindable, BindableProperty, PropertyStore};
//!
//! #[derive(Default)]
//! struct Label {
//!     properties: PropertyStore,
//! }
//!
//! impl Bindable for Label {
//!     fn property_store(&self) -> &PropertyStore {
//!         &self.properties
//!     }
//! }
//!
//! static TEXT: LazyLock<BindableProperty<Label, String>> = LazyLock::new(|| {
//!     BindableProperty::<Label, String>::declare("Text", String::new())
//!         .expect("Text is declared once")
//! });
//!
//! let label = Label::default();
//! assert_eq!(TEXT.get(&label), "");
//! assert!(TEXT.set(&label, "hello".to_owned()).unwrap());
//! // Writing the same value again is a no-op.
//! assert!(!TEXT.set(&label, "hello".to_owned()).unwrap());
//! ```
//!
//! # Change propagation
//!
//! Change callbacks run synchronously on the calling thread, after the store
//! has been updated and before `set` returns. The store lock is never held
//! while callbacks run, so a callback may read or write other properties of
//! the same instance.
#![deny(missing_docs, clippy::unwrap_used)]

pub mod callback;
mod error;
pub mod line_height;
pub mod observer;
mod property;
mod registry;
mod store;
mod value;

pub use crate::{
    callback::Callback,
    error::PropertyError,
    line_height::{LINE_HEIGHT, LineHeightElement},
    observer::{HandlerList, Subscription},
    property::{AnyProperty, BindableProperty, PropertyBuilder, PropertyId},
    registry::lookup,
    store::{Bindable, PropertyChanged, PropertyStore},
    value::{ErasedValue, PropertyValue},
};
