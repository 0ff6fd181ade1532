use tracing::info;
use trellis_property::{Bindable, LineHeightElement, PropertyStore};

/// Minimal text element that reacts to line height changes.
#[derive(Default)]
pub struct Label {
    properties: PropertyStore,
}

impl Bindable for Label {
    fn property_store(&self) -> &PropertyStore {
        &self.properties
    }
}

impl LineHeightElement for Label {
    fn on_line_height_changed(&self, old: f64, new: f64) {
        info!(old, new, "label relayout");
    }
}
