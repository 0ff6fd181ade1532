//! Process-wide table of declared properties.
//!
//! Declarations are keyed by owner type and property name. The table hosts
//! both the typed descriptor (for idempotent re-declaration) and its erased
//! [`AnyProperty`] view (for name-based lookup by bindings and adapters).

use std::{
    any::{Any, TypeId, type_name},
    sync::{Arc, OnceLock},
};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::trace;

use crate::{
    Bindable, PropertyError,
    property::{AnyProperty, BindableProperty, PropertyDefinition},
    value::PropertyValue,
};

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct RegistryKey {
    owner: TypeId,
    name: String,
}

struct RegistryEntry {
    value_type: TypeId,
    value_type_name: &'static str,
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn Any + Send + Sync>,
}

static REGISTRY: OnceLock<DashMap<RegistryKey, RegistryEntry>> = OnceLock::new();

fn registry() -> &'static DashMap<RegistryKey, RegistryEntry> {
    REGISTRY.get_or_init(DashMap::new)
}

/// Register `definition` under its owner and name, or return the descriptor
/// that already holds that identity.
pub(crate) fn declare<O, T>(
    definition: PropertyDefinition<O, T>,
) -> Result<BindableProperty<O, T>, PropertyError>
where
    O: ?Sized + Bindable + 'static,
    T: PropertyValue,
{
    let key = RegistryKey {
        owner: TypeId::of::<O>(),
        name: definition.name().to_owned(),
    };

    match registry().entry(key) {
        Entry::Occupied(entry) => {
            let existing = entry.get();
            let mismatch = || PropertyError::TypeMismatch {
                property: definition.name().to_owned(),
                expected: existing.value_type_name,
                found: type_name::<T>(),
            };
            if existing.value_type != TypeId::of::<T>() {
                return Err(mismatch());
            }
            existing
                .typed
                .clone()
                .downcast::<BindableProperty<O, T>>()
                .map(|property| (*property).clone())
                .map_err(|_| mismatch())
        }
        Entry::Vacant(entry) => {
            let property = BindableProperty::from_definition(definition);
            let erased: Arc<dyn AnyProperty<O>> = Arc::new(property.clone());
            trace!(
                owner = type_name::<O>(),
                property = property.name(),
                value_type = type_name::<T>(),
                "declared bindable property"
            );
            entry.insert(RegistryEntry {
                value_type: TypeId::of::<T>(),
                value_type_name: type_name::<T>(),
                typed: Arc::new(property.clone()),
                erased: Arc::new(erased),
            });
            Ok(property)
        }
    }
}

/// Look up a declared property of owner `O` by name.
///
/// Returns the erased view, which accepts boxed values and reports
/// [`PropertyError::TypeMismatch`] for values of the wrong type.
pub fn lookup<O>(name: &str) -> Option<Arc<dyn AnyProperty<O>>>
where
    O: ?Sized + 'static,
{
    let key = RegistryKey {
        owner: TypeId::of::<O>(),
        name: name.to_owned(),
    };
    let entry = registry().get(&key)?;
    entry
        .erased
        .downcast_ref::<Arc<dyn AnyProperty<O>>>()
        .cloned()
}
