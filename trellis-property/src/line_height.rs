//! Line height capability shared by text elements.

use std::sync::LazyLock;

use crate::{Bindable, BindableProperty};

/// Elements that render text with a configurable line height.
pub trait LineHeightElement: Bindable {
    /// Called after the effective line height changed.
    fn on_line_height_changed(&self, old: f64, new: f64);
}

/// Line height multiplier. `-1.0` means "use the platform default".
pub static LINE_HEIGHT: LazyLock<BindableProperty<dyn LineHeightElement, f64>> =
    LazyLock::new(|| {
        BindableProperty::<dyn LineHeightElement, f64>::builder("LineHeight", -1.0)
            .on_changed(|element, old, new| {
                element.on_line_height_changed(*old, *new);
            })
            .declare()
            .expect("LineHeight is declared once")
    });

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use crate::{Bindable, PropertyStore};

    use super::{LINE_HEIGHT, LineHeightElement};

    #[derive(Default)]
    struct Label {
        properties: PropertyStore,
        layout_passes: Mutex<Vec<(f64, f64)>>,
    }

    impl Bindable for Label {
        fn property_store(&self) -> &PropertyStore {
            &self.properties
        }
    }

    impl LineHeightElement for Label {
        fn on_line_height_changed(&self, old: f64, new: f64) {
            self.layout_passes.lock().push((old, new));
        }
    }

    #[derive(Default)]
    struct Span {
        properties: PropertyStore,
    }

    impl Bindable for Span {
        fn property_store(&self) -> &PropertyStore {
            &self.properties
        }
    }

    impl LineHeightElement for Span {
        fn on_line_height_changed(&self, _old: f64, _new: f64) {}
    }

    #[test]
    fn line_height_defaults_to_platform_value() {
        let label = Label::default();
        assert_eq!(LINE_HEIGHT.get(&label), -1.0);
    }

    #[test]
    fn change_is_forwarded_to_the_element() {
        let label = Label::default();
        assert_eq!(LINE_HEIGHT.set(&label, 1.5), Ok(true));
        assert_eq!(LINE_HEIGHT.set(&label, 1.5), Ok(false));
        assert_eq!(*label.layout_passes.lock(), vec![(-1.0, 1.5)]);
    }

    #[test]
    fn values_are_held_per_instance() {
        let label = Label::default();
        let span = Span::default();
        LINE_HEIGHT.set(&span, 2.0).expect("valid value");
        assert_eq!(LINE_HEIGHT.get(&span), 2.0);
        assert_eq!(LINE_HEIGHT.get(&label), -1.0);
        assert!(label.layout_passes.lock().is_empty());
    }
}
