use crate::{ElementId, Rect};

/// The scrolling container hosting a repeater.
///
/// The repeater pulls the viewport once per layout pass and only when
/// [`ScrollOwner::take_viewport_changed`] reports a change.
pub trait ScrollOwner {
    /// The viewport in repeater coordinates, `None` when the repeater is not in view at all.
    fn viewport(&self) -> Option<Rect>;

    /// Returns `true` once after each viewport change.
    fn take_viewport_changed(&mut self) -> bool;

    /// The element the owner currently anchors scroll position on.
    fn current_anchor(&self) -> Option<ElementId>;

    fn register_anchor_candidate(&mut self, element: ElementId);

    fn unregister_anchor_candidate(&mut self, element: ElementId);

    /// Called after every arrange pass with the repeater extent and the arranged slot of each
    /// element still in the layout.
    fn on_owner_arranged(&mut self, extent: Rect, slot_of: &dyn Fn(ElementId) -> Option<Rect>) {
        let _ = (extent, slot_of);
    }

    /// Asks the owner to scroll `bounds` into view.
    fn bring_into_view(&mut self, element: ElementId, bounds: Option<Rect>) {
        let _ = (element, bounds);
    }
}
