use crate::ElementId;

/// Lifecycle notifications queued during layout and collection-change handling.
///
/// Drain them with [`crate::ItemsRepeater::drain_events`] within the same frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeaterEvent {
    /// A factory element was bound to `index` and handed to the layout.
    ElementPrepared { element: ElementId, index: usize },
    /// An element is about to go back to the factory.
    ElementClearing { element: ElementId },
    /// A realized element now represents a different item position.
    ElementIndexChanged {
        element: ElementId,
        old_index: usize,
        new_index: usize,
    },
    /// The focused element was cleared; the host should move focus to `element`.
    FocusRequested { element: ElementId },
}
