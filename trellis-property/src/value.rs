//! Property value bounds and the type-erased storage representation.

use std::any::type_name;

use downcast_rs::{DowncastSync, impl_downcast};
use dyn_clone::DynClone;

/// Values that can be held by a bindable property.
///
/// Equality decides whether a write is an effective change.
pub trait PropertyValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> PropertyValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Type-erased property value as held by a [`PropertyStore`](crate::PropertyStore).
pub trait ErasedValue: DowncastSync + DynClone {
    /// Compare with another erased value. Values of different types are never equal.
    fn value_eq(&self, other: &dyn ErasedValue) -> bool;
    /// Name of the concrete value type, used in diagnostics.
    fn value_type_name(&self) -> &'static str;
}

impl_downcast!(sync ErasedValue);
dyn_clone::clone_trait_object!(ErasedValue);

impl<T> ErasedValue for T
where
    T: PropertyValue,
{
    fn value_eq(&self, other: &dyn ErasedValue) -> bool {
        let Some(other) = other.downcast_ref::<T>() else {
            return false;
        };
        self == other
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::ErasedValue;

    #[test]
    fn erased_values_compare_by_type_and_value() {
        let a: Box<dyn ErasedValue> = Box::new(1.5_f64);
        let b: Box<dyn ErasedValue> = Box::new(1.5_f64);
        let c: Box<dyn ErasedValue> = Box::new(String::from("1.5"));

        assert!(a.value_eq(&*b));
        assert!(!a.value_eq(&*c));
        assert_eq!(c.value_type_name(), "alloc::string::String");
    }

    #[test]
    fn erased_values_clone_and_downcast() {
        let original: Box<dyn ErasedValue> = Box::new(vec![1_u8, 2, 3]);
        let copy = original.clone();
        assert_eq!(copy.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
        assert!(copy.downcast::<f32>().is_err());
    }
}
