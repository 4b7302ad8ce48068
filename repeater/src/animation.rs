use alloc::vec::Vec;

use crate::{AnimationContext, CollectionChange, ElementId, Rect};

/// Plays show/hide/bounds-change animations for repeater children.
///
/// Capability queries run while the repeater is deciding an element's fate; the matching
/// `start_*` calls are deferred to the next rendering tick. A hide animation keeps the element
/// alive until the host reports completion through
/// [`crate::ItemsRepeater::on_hide_animation_completed`].
pub trait ElementAnimator {
    fn has_show_animation(&self, element: ElementId, context: AnimationContext) -> bool;

    fn has_hide_animation(&self, element: ElementId, context: AnimationContext) -> bool;

    fn has_bounds_change_animation(
        &self,
        element: ElementId,
        context: AnimationContext,
        old_bounds: Rect,
        new_bounds: Rect,
    ) -> bool;

    fn start_show_animation(&mut self, element: ElementId, context: AnimationContext);

    fn start_hide_animation(&mut self, element: ElementId, context: AnimationContext);

    fn start_bounds_change_animation(
        &mut self,
        element: ElementId,
        context: AnimationContext,
        old_bounds: Rect,
        new_bounds: Rect,
    );
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingBoundsChange {
    element: ElementId,
    context: AnimationContext,
    old_bounds: Rect,
    new_bounds: Rect,
}

/// Records what changed during an arrange cycle and queues animations for the next frame.
#[derive(Clone, Debug, Default)]
pub struct AnimationManager {
    recorded: AnimationContext,
    pending_shows: Vec<(ElementId, AnimationContext)>,
    pending_hides: Vec<(ElementId, AnimationContext)>,
    pending_bounds_changes: Vec<PendingBoundsChange>,
    rendering_requested: bool,
}

impl AnimationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change categories recorded since the last reset.
    pub fn recorded_context(&self) -> AnimationContext {
        self.recorded
    }

    pub fn has_pending_animations(&self) -> bool {
        !self.pending_shows.is_empty()
            || !self.pending_hides.is_empty()
            || !self.pending_bounds_changes.is_empty()
    }

    pub fn is_rendering_requested(&self) -> bool {
        self.rendering_requested
    }

    pub fn on_items_source_changed(&mut self, change: &CollectionChange) {
        self.recorded |= match change {
            CollectionChange::Add { .. } => AnimationContext::COLLECTION_CHANGE_ADD,
            CollectionChange::Remove { .. } => AnimationContext::COLLECTION_CHANGE_REMOVE,
            CollectionChange::Replace { .. } | CollectionChange::Move { .. } => {
                AnimationContext::COLLECTION_CHANGE_ADD | AnimationContext::COLLECTION_CHANGE_REMOVE
            }
            CollectionChange::Reset => AnimationContext::COLLECTION_CHANGE_RESET,
        };
    }

    pub fn on_layout_changing(&mut self) {
        self.recorded |= AnimationContext::LAYOUT_TRANSITION;
    }

    fn context_for(&self, include: AnimationContext) -> AnimationContext {
        self.recorded.intersection(include)
    }

    pub fn on_element_prepared(
        &mut self,
        animator: Option<&(dyn ElementAnimator + 'static)>,
        element: ElementId,
    ) {
        let Some(animator) = animator else {
            return;
        };
        let context = self.context_for(
            AnimationContext::COLLECTION_CHANGE_ADD
                | AnimationContext::COLLECTION_CHANGE_RESET
                | AnimationContext::LAYOUT_TRANSITION,
        );
        if animator.has_show_animation(element, context) {
            self.pending_shows.push((element, context));
        }
    }

    /// Offers a leaving element to the animator. Returns `true` when a hide animation claims it,
    /// in which case recycling waits for the animation to complete.
    pub fn clear_element(
        &mut self,
        animator: Option<&(dyn ElementAnimator + 'static)>,
        element: ElementId,
    ) -> bool {
        let Some(animator) = animator else {
            return false;
        };
        let context = self.context_for(
            AnimationContext::COLLECTION_CHANGE_REMOVE
                | AnimationContext::COLLECTION_CHANGE_RESET
                | AnimationContext::LAYOUT_TRANSITION,
        );
        let claimed = animator.has_hide_animation(element, context);
        if claimed {
            rtrace!(element = element.0, context = context.bits(), "hide animation claims element");
            self.pending_shows.retain(|&(e, _)| e != element);
            self.pending_hides.push((element, context));
        }
        claimed
    }

    pub fn on_element_bounds_changed(
        &mut self,
        animator: Option<&(dyn ElementAnimator + 'static)>,
        element: ElementId,
        old_bounds: Rect,
        new_bounds: Rect,
    ) {
        let Some(animator) = animator else {
            return;
        };
        let context = self.recorded;
        if animator.has_bounds_change_animation(element, context, old_bounds, new_bounds) {
            self.pending_bounds_changes.push(PendingBoundsChange {
                element,
                context,
                old_bounds,
                new_bounds,
            });
        }
    }

    /// Ends an arrange cycle: requests a rendering tick when animations are queued, otherwise
    /// forgets the recorded context.
    pub fn on_owner_arranged(&mut self) {
        if self.has_pending_animations() {
            self.rendering_requested = true;
        } else {
            self.recorded = AnimationContext::NONE;
        }
    }

    /// Starts queued animations. `still_shown` filters out show and bounds animations whose
    /// element left the layout since they were queued.
    pub fn on_rendering(
        &mut self,
        animator: Option<&mut (dyn ElementAnimator + 'static)>,
        still_shown: impl Fn(ElementId) -> bool,
    ) {
        if !self.rendering_requested {
            return;
        }
        if let Some(animator) = animator {
            for &(element, context) in &self.pending_hides {
                animator.start_hide_animation(element, context);
            }
            for change in &self.pending_bounds_changes {
                if still_shown(change.element) {
                    animator.start_bounds_change_animation(
                        change.element,
                        change.context,
                        change.old_bounds,
                        change.new_bounds,
                    );
                }
            }
            for &(element, context) in &self.pending_shows {
                if still_shown(element) {
                    animator.start_show_animation(element, context);
                }
            }
        }
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.pending_shows.clear();
        self.pending_hides.clear();
        self.pending_bounds_changes.clear();
        self.recorded = AnimationContext::NONE;
        self.rendering_requested = false;
    }
}
