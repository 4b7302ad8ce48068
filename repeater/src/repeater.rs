use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::registry::ElementRegistry;
use crate::{
    AnimationManager, BuildTreeScheduler, Clock, CollectionChange, ElementAnimator, ElementFactory,
    ElementId, ElementOwner, ElementRealizationOptions, ItemsSource, Layout, LayoutContext, Phaser,
    Point, Rect, RepeaterError, RepeaterEvent, RepeaterOptions, ScrollOwner, Size, ViewManager,
    ViewportManager, VirtualizationInfo,
};

/// Work items run by the repeater's [`BuildTreeScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RepeaterWork {
    Phasing,
    CacheBuild,
}

/// Cache building only invalidates measure; anything else goes first.
const CACHE_BUILD_PRIORITY: u32 = u32::MAX;

/// Mutable view of everything the [`ViewManager`] works against, split off the repeater so the
/// manager itself can be borrowed alongside it.
pub(crate) struct RepeaterCx<'a, S: ItemsSource> {
    pub(crate) source: &'a S,
    pub(crate) factory: &'a mut (dyn ElementFactory<S::Item> + 'static),
    pub(crate) animator: Option<&'a mut (dyn ElementAnimator + 'static)>,
    pub(crate) scroll_owner: Option<&'a mut (dyn ScrollOwner + 'static)>,
    pub(crate) registry: &'a mut ElementRegistry,
    pub(crate) viewport: &'a mut ViewportManager,
    pub(crate) animations: &'a mut AnimationManager,
    pub(crate) phaser: &'a mut Phaser,
    pub(crate) scheduler: &'a mut BuildTreeScheduler<RepeaterWork>,
    pub(crate) events: &'a mut Vec<RepeaterEvent>,
    pub(crate) measure_invalid: &'a mut bool,
}

impl<S: ItemsSource> RepeaterCx<'_, S> {
    pub(crate) fn raise(&mut self, event: RepeaterEvent) {
        self.events.push(event);
    }

    pub(crate) fn invalidate_measure(&mut self) {
        *self.measure_invalid = true;
    }
}

/// Presents an [`ItemsSource`] through a pluggable [`Layout`], keeping only the elements the
/// layout needs alive.
///
/// The host drives it a frame at a time:
/// 1. [`Self::sync_viewport`] to pick up scrolling,
/// 2. [`Self::measure`] and [`Self::arrange`] while they are invalid,
/// 3. [`Self::on_layout_updated`] once layout has settled,
/// 4. [`Self::on_rendering`] on the rendering tick.
///
/// Data changes are applied to the source first (see [`Self::items_source_mut`]) and then
/// reported through [`Self::on_items_changed`].
pub struct ItemsRepeater<S: ItemsSource> {
    source: S,
    factory: Box<dyn ElementFactory<S::Item>>,
    layout: Option<Box<dyn Layout>>,
    layout_borrowed: bool,
    animator: Option<Box<dyn ElementAnimator>>,
    scroll_owner: Option<Box<dyn ScrollOwner>>,

    registry: ElementRegistry,
    view_manager: ViewManager,
    viewport_manager: ViewportManager,
    animation_manager: AnimationManager,
    phaser: Phaser,
    scheduler: BuildTreeScheduler<RepeaterWork>,
    events: Vec<RepeaterEvent>,

    options: RepeaterOptions,
    layout_origin: Point,
    desired_size: Size,
    measure_invalid: bool,
    arrange_valid: bool,
    is_layout_in_progress: bool,
    needs_viewport_sync: bool,
    processing_change: Option<CollectionChange>,
}

impl<S: ItemsSource> ItemsRepeater<S> {
    pub fn new(source: S, factory: impl ElementFactory<S::Item> + 'static) -> Self {
        Self::build(source, Box::new(factory), RepeaterOptions::default())
    }

    pub fn with_options(
        source: S,
        factory: impl ElementFactory<S::Item> + 'static,
        options: RepeaterOptions,
    ) -> Result<Self, RepeaterError> {
        options.validate()?;
        Ok(Self::build(source, Box::new(factory), options))
    }

    fn build(source: S, factory: Box<dyn ElementFactory<S::Item>>, options: RepeaterOptions) -> Self {
        Self {
            source,
            factory,
            layout: None,
            layout_borrowed: false,
            animator: None,
            scroll_owner: None,
            registry: ElementRegistry::new(),
            view_manager: ViewManager::new(),
            viewport_manager: ViewportManager::new(&options),
            animation_manager: AnimationManager::new(),
            phaser: Phaser::new(),
            scheduler: BuildTreeScheduler::new(options.scheduler_budget_ms),
            events: Vec::new(),
            options,
            layout_origin: Point::ZERO,
            desired_size: Size::ZERO,
            measure_invalid: true,
            arrange_valid: false,
            is_layout_in_progress: false,
            needs_viewport_sync: false,
            processing_change: None,
        }
    }

    fn parts(&mut self) -> (&mut ViewManager, RepeaterCx<'_, S>) {
        (
            &mut self.view_manager,
            RepeaterCx {
                source: &self.source,
                factory: &mut *self.factory,
                animator: self.animator.as_deref_mut(),
                scroll_owner: self.scroll_owner.as_deref_mut(),
                registry: &mut self.registry,
                viewport: &mut self.viewport_manager,
                animations: &mut self.animation_manager,
                phaser: &mut self.phaser,
                scheduler: &mut self.scheduler,
                events: &mut self.events,
                measure_invalid: &mut self.measure_invalid,
            },
        )
    }

    pub fn options(&self) -> &RepeaterOptions {
        &self.options
    }

    pub fn items_source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source. Structural changes must be reported through
    /// [`Self::on_items_changed`] afterwards.
    pub fn items_source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn has_layout(&self) -> bool {
        self.layout.is_some() || self.layout_borrowed
    }

    pub fn has_scroll_owner(&self) -> bool {
        self.scroll_owner.is_some()
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn view_manager(&self) -> &ViewManager {
        &self.view_manager
    }

    pub fn viewport_manager(&self) -> &ViewportManager {
        &self.viewport_manager
    }

    pub fn animation_manager(&self) -> &AnimationManager {
        &self.animation_manager
    }

    pub fn phaser(&self) -> &Phaser {
        &self.phaser
    }

    /// Every element this repeater has seen and the factory has not discarded.
    pub fn children(&self) -> &[ElementId] {
        self.registry.children()
    }

    pub fn virtualization_info(&self, element: ElementId) -> Option<&VirtualizationInfo> {
        self.registry.info(element)
    }

    /// Where the layout placed `element`, relative to the repeater.
    pub fn layout_slot(&self, element: ElementId) -> Option<Rect> {
        self.registry.layout_slot(element)
    }

    /// The realized element bound to `index`, if any.
    pub fn try_get_element(&self, index: usize) -> Option<ElementId> {
        self.registry.realized_element_at(index)
    }

    /// Index of a realized element; `Ok(None)` when it is not bound to an item.
    pub fn element_index(&self, element: ElementId) -> Result<Option<usize>, RepeaterError> {
        self.view_manager.element_index(&self.registry, element)
    }

    pub fn desired_size(&self) -> Size {
        self.desired_size
    }

    /// Visible window in layout coordinates.
    pub fn visible_window(&self) -> Rect {
        self.viewport_manager.layout_visible_window()
    }

    /// Realization window in layout coordinates.
    pub fn realization_window(&self) -> Rect {
        self.viewport_manager.layout_realization_window()
    }

    pub fn suggested_anchor(&self) -> Option<ElementId> {
        self.viewport_manager
            .suggested_anchor(&self.registry, self.scroll_owner.as_deref())
    }

    pub fn horizontal_cache_length(&self) -> f64 {
        self.viewport_manager.horizontal_cache_length()
    }

    pub fn vertical_cache_length(&self) -> f64 {
        self.viewport_manager.vertical_cache_length()
    }

    pub fn set_horizontal_cache_length(&mut self, value: f64) -> Result<(), RepeaterError> {
        self.viewport_manager.set_horizontal_cache_length(value)?;
        self.options.horizontal_cache_length = value;
        self.drain_viewport_requests();
        Ok(())
    }

    pub fn set_vertical_cache_length(&mut self, value: f64) -> Result<(), RepeaterError> {
        self.viewport_manager.set_vertical_cache_length(value)?;
        self.options.vertical_cache_length = value;
        self.drain_viewport_requests();
        Ok(())
    }

    pub fn is_measure_valid(&self) -> bool {
        !self.measure_invalid
    }

    pub fn is_arrange_valid(&self) -> bool {
        self.arrange_valid && !self.measure_invalid
    }

    pub fn invalidate_measure(&mut self) {
        self.measure_invalid = true;
    }

    pub fn invalidate_arrange(&mut self) {
        self.arrange_valid = false;
    }

    /// Whether a rendering tick has something to do.
    pub fn needs_rendering(&self) -> bool {
        self.animation_manager.is_rendering_requested()
            || self.viewport_manager.is_rendering_requested()
            || self.scheduler.has_pending_work()
    }

    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_pending_work()
    }

    /// Takes the lifecycle events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<RepeaterEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn set_animator(&mut self, animator: Option<Box<dyn ElementAnimator>>) {
        self.animator = animator;
    }

    /// Attaches or detaches the scrolling container. Current anchor candidates are registered
    /// with the new owner.
    pub fn set_scroll_owner(&mut self, scroll_owner: Option<Box<dyn ScrollOwner>>) {
        assert!(
            !self.is_layout_in_progress,
            "scroll owner cannot change during layout"
        );
        self.scroll_owner = scroll_owner;
        if let Some(owner) = self.scroll_owner.as_deref_mut() {
            for &child in self.registry.children() {
                if self
                    .registry
                    .info(child)
                    .is_some_and(|i| i.can_be_scroll_anchor())
                {
                    owner.register_anchor_candidate(child);
                }
            }
        }
        self.viewport_manager
            .on_scroller_changed(self.scroll_owner.is_some());
        self.needs_viewport_sync = self.scroll_owner.is_some();
        self.measure_invalid = true;
        self.drain_viewport_requests();
    }

    /// Swaps the layout. Every element held by the old layout is cleared; keyed sources get the
    /// elements back by identity.
    pub fn set_layout(&mut self, layout: Option<Box<dyn Layout>>) {
        assert!(
            !self.is_layout_in_progress,
            "layout cannot be changed during layout"
        );
        rdebug!(has_layout = layout.is_some(), "ItemsRepeater::set_layout");

        {
            let (view_manager, mut cx) = self.parts();
            view_manager.on_layout_changing(&mut cx);
        }
        self.animation_manager.on_layout_changing();

        if let Some(mut old) = self.layout.take() {
            self.layout_borrowed = true;
            old.uninitialize_for_context(self);
            self.layout_borrowed = false;
            let held = self.registry.collect_children(|i| i.is_held_by_layout());
            for element in held {
                self.clear_element_impl(element);
            }
        }

        let is_virtualizing = layout.as_ref().is_some_and(|l| l.is_virtualizing());
        let has_layout = layout.is_some();
        if let Some(mut new) = layout {
            self.layout_borrowed = true;
            new.initialize_for_context(self);
            self.layout_borrowed = false;
            self.layout = Some(new);
        }

        if !has_layout {
            self.scheduler
                .cancel(|w| *w == RepeaterWork::CacheBuild);
            self.viewport_manager.cancel_cache_build();
        }
        self.viewport_manager
            .on_layout_changed(has_layout, is_virtualizing);
        self.layout_origin = Point::ZERO;
        self.measure_invalid = true;
        self.drain_viewport_requests();
    }

    /// Replaces the items source; the layout sees it as a `Reset`.
    pub fn set_items_source(&mut self, source: S) -> S {
        assert!(
            !self.is_layout_in_progress,
            "items source cannot be changed during layout"
        );
        let old = core::mem::replace(&mut self.source, source);
        self.process_change(CollectionChange::Reset);
        self.measure_invalid = true;
        old
    }

    /// Reports a structural change already applied to the items source.
    ///
    /// Panics when called during layout or while another change is being processed.
    pub fn on_items_changed(&mut self, change: CollectionChange) -> Result<(), RepeaterError> {
        validate_change(&change, self.source.count())?;
        self.process_change(change);
        Ok(())
    }

    fn process_change(&mut self, change: CollectionChange) {
        assert!(
            !self.is_layout_in_progress,
            "changes in the items source are not allowed during layout"
        );
        assert!(
            self.processing_change.is_none(),
            "changes in the items source are not allowed while another change is processed"
        );
        rdebug!(?change, count = self.source.count(), "ItemsRepeater::on_items_changed");

        self.processing_change = Some(change);
        self.animation_manager.on_items_source_changed(&change);
        let result = {
            let (view_manager, mut cx) = self.parts();
            view_manager.on_items_source_changed(&mut cx, &change)
        };
        debug_assert!(result.is_ok(), "change passed validation: {result:?}");

        if let Some(mut layout) = self.layout.take() {
            self.layout_borrowed = true;
            if layout.is_virtualizing() {
                layout.on_items_changed(self, &change);
            } else {
                self.measure_invalid = true;
            }
            self.layout_borrowed = false;
            self.layout = Some(layout);
        }
        self.processing_change = None;
        self.drain_viewport_requests();
    }

    /// Pulls the viewport from the scroll owner when it reports a change.
    pub fn sync_viewport(&mut self) {
        let Some(owner) = self.scroll_owner.as_deref_mut() else {
            return;
        };
        let changed = owner.take_viewport_changed();
        let first_sync = core::mem::take(&mut self.needs_viewport_sync);
        if changed || first_sync {
            let viewport = owner.viewport();
            self.viewport_manager.on_effective_viewport_changed(viewport);
            self.drain_viewport_requests();
        }
    }

    pub fn measure(&mut self, available: Size) -> Size {
        assert!(!self.is_layout_in_progress, "re-entrant measure");
        assert!(
            self.processing_change.is_none(),
            "measure while a collection change is processed"
        );
        self.sync_viewport();
        self.is_layout_in_progress = true;
        self.measure_invalid = false;

        {
            let (view_manager, mut cx) = self.parts();
            view_manager.prune_pinned_elements(&mut cx);
        }

        let desired = match self.layout.take() {
            Some(mut layout) => {
                self.layout_borrowed = true;
                let desired = layout.measure(self, available);
                self.layout_borrowed = false;
                self.layout = Some(layout);
                desired
            }
            None => Size::ZERO,
        };
        let extent = Rect::new(
            self.layout_origin.x,
            self.layout_origin.y,
            desired.width,
            desired.height,
        );

        // Elements realized through the context that nobody asked for again in this pass.
        let unused = self.registry.collect_children(|i| {
            i.is_held_by_layout() && i.auto_recycle_candidate() && !i.keep_alive()
        });
        for element in unused {
            rtrace!(element = element.0, "auto-recycling element");
            self.clear_element_impl(element);
        }

        self.viewport_manager.set_layout_extent(extent);
        self.desired_size = desired;
        self.arrange_valid = false;
        self.is_layout_in_progress = false;
        self.drain_viewport_requests();
        rtrace!(width = desired.width, height = desired.height, "measure done");
        desired
    }

    pub fn arrange(&mut self, final_size: Size) -> Size {
        assert!(!self.is_layout_in_progress, "re-entrant arrange");
        self.is_layout_in_progress = true;

        let arranged = match self.layout.take() {
            Some(mut layout) => {
                self.layout_borrowed = true;
                let arranged = layout.arrange(self, final_size);
                self.layout_borrowed = false;
                self.layout = Some(layout);
                arranged
            }
            None => final_size,
        };

        {
            let (view_manager, mut cx) = self.parts();
            view_manager.on_owner_arranged(&mut cx);
        }

        for child in self.registry.children().to_vec() {
            let info = self.registry.expect_info_mut(child);
            info.set_keep_alive(false);
            match info.owner() {
                ElementOwner::ElementFactory | ElementOwner::PinnedPool => {
                    self.registry.set_layout_slot(child, None);
                }
                _ => {
                    let Some(slot) = self.registry.layout_slot(child) else {
                        continue;
                    };
                    let info = self.registry.expect_info_mut(child);
                    if let Some(old) = info.arrange_bounds() {
                        if old != slot {
                            self.animation_manager.on_element_bounds_changed(
                                self.animator.as_deref(),
                                child,
                                old,
                                slot,
                            );
                        }
                    }
                    info.set_arrange_bounds(Some(slot));
                }
            }
        }

        self.viewport_manager.on_owner_arranged();
        self.animation_manager.on_owner_arranged();

        let registry = &self.registry;
        if let Some(owner) = self.scroll_owner.as_deref_mut() {
            let extent = Rect::from_origin_size(Point::ZERO, self.desired_size);
            owner.on_owner_arranged(extent, &|element| {
                registry
                    .info(element)
                    .filter(|i| i.is_held_by_layout())
                    .and_then(|_| registry.layout_slot(element))
            });
        }

        self.arrange_valid = true;
        self.is_layout_in_progress = false;
        self.drain_viewport_requests();
        arranged
    }

    /// Layout settled for this frame. Applies the unhonored viewport shift fallback.
    pub fn on_layout_updated(&mut self) {
        self.viewport_manager.on_layout_updated();
        self.drain_viewport_requests();
    }

    /// Rendering tick: starts queued animations, ends bring-into-view, then runs scheduled work
    /// until the frame budget is spent. Returns the number of work items run.
    pub fn on_rendering(&mut self, clock: &dyn Clock) -> usize {
        let registry = &self.registry;
        self.animation_manager
            .on_rendering(self.animator.as_deref_mut(), |element| {
                registry
                    .info(element)
                    .is_some_and(|i| i.is_held_by_layout())
            });
        self.viewport_manager
            .on_rendering(&mut self.registry, self.scroll_owner.as_deref_mut());
        self.drain_viewport_requests();

        self.scheduler.begin_frame(clock.now_ms());
        let mut ran = 0;
        while let Some(work) = self.scheduler.next_work(clock.now_ms()) {
            match work {
                RepeaterWork::Phasing => {
                    let window = self.viewport_manager.visible_window();
                    self.phaser.do_phased_work(
                        &mut self.registry,
                        &mut *self.factory,
                        &self.source,
                        &mut self.scheduler,
                        window,
                        clock,
                    );
                }
                RepeaterWork::CacheBuild => {
                    self.viewport_manager.on_cache_build_completed();
                    self.drain_viewport_requests();
                }
            }
            ran += 1;
        }
        ran
    }

    /// Realizes the element for `index` (or finds it) and makes it the suggested anchor until
    /// the next rendered frame, so a following bring-into-view lands on it.
    pub fn get_or_create_element(&mut self, index: usize) -> Result<ElementId, RepeaterError> {
        let count = self.source.count();
        if index >= count {
            return Err(RepeaterError::IndexOutOfBounds { index, count });
        }
        assert!(
            !self.is_layout_in_progress,
            "get_or_create_element is not allowed during layout"
        );

        let existing = self.registry.realized_element_at(index);
        let outside_realized_range = existing.is_none();
        let element = match existing {
            Some(element) => element,
            None => {
                if !self.has_layout() {
                    return Err(RepeaterError::NoLayout);
                }
                self.get_or_create_element_at(index, ElementRealizationOptions::NONE)
            }
        };

        self.viewport_manager
            .on_make_anchor(element, outside_realized_range);
        self.measure_invalid = true;
        Ok(element)
    }

    /// Restricts anchor candidacy to `element` and asks the scroll owner to bring it into view.
    pub fn start_bring_into_view(&mut self, element: ElementId) -> Result<(), RepeaterError> {
        self.viewport_manager.on_bring_into_view_requested(
            &mut self.registry,
            self.scroll_owner.as_deref_mut(),
            element,
        )?;
        let slot = self.registry.layout_slot(element);
        if let Some(owner) = self.scroll_owner.as_deref_mut() {
            owner.bring_into_view(element, slot);
        }
        self.drain_viewport_requests();
        Ok(())
    }

    pub fn pin_element(&mut self, element: ElementId) -> Result<(), RepeaterError> {
        let (view_manager, mut cx) = self.parts();
        view_manager.update_pin(&mut cx, element, true)
    }

    pub fn unpin_element(&mut self, element: ElementId) -> Result<(), RepeaterError> {
        let (view_manager, mut cx) = self.parts();
        view_manager.update_pin(&mut cx, element, false)
    }

    /// Reports the element that holds keyboard focus. It stays pinned while focused.
    pub fn set_focused_element(&mut self, element: Option<ElementId>) -> Result<(), RepeaterError> {
        let (view_manager, mut cx) = self.parts();
        view_manager.update_focused_element(&mut cx, element)
    }

    pub fn focused_element(&self) -> Option<ElementId> {
        self.view_manager.last_focused()
    }

    /// A hide animation finished; the element finally goes back to the factory.
    ///
    /// Stale notifications for elements no longer owned by the animator are ignored.
    pub fn on_hide_animation_completed(&mut self, element: ElementId) -> Result<(), RepeaterError> {
        let info = self.registry.info(element).ok_or(RepeaterError::NotAChild)?;
        if info.owner() != ElementOwner::Animator {
            rdebug!(element = element.0, "stale hide animation completion ignored");
            return Ok(());
        }
        let (view_manager, mut cx) = self.parts();
        view_manager.clear_element_to_element_factory(&mut cx, element);
        Ok(())
    }

    fn clear_element_impl(&mut self, element: ElementId) {
        // Clears driven by a removing change ignore pins.
        let forced = self
            .processing_change
            .is_some_and(|change| change.forces_clear());
        let (view_manager, mut cx) = self.parts();
        cx.viewport
            .on_element_cleared(cx.registry, cx.scroll_owner.as_deref_mut(), element);
        view_manager.clear_element(&mut cx, element, forced);
    }

    fn drain_viewport_requests(&mut self) {
        if self.viewport_manager.take_measure_request() {
            self.measure_invalid = true;
        }
        if self.viewport_manager.take_cache_build_request() {
            self.scheduler
                .register_work(CACHE_BUILD_PRIORITY, RepeaterWork::CacheBuild);
        }
    }
}

impl<S: ItemsSource> LayoutContext for ItemsRepeater<S> {
    fn item_count(&self) -> usize {
        self.source.count()
    }

    fn get_or_create_element_at(
        &mut self,
        index: usize,
        options: ElementRealizationOptions,
    ) -> ElementId {
        let count = self.source.count();
        assert!(index < count, "index {index} out of range (count {count})");
        let force_create = options.contains(ElementRealizationOptions::FORCE_CREATE);
        let suppress = options.contains(ElementRealizationOptions::SUPPRESS_AUTO_RECYCLE);
        let element = {
            let (view_manager, mut cx) = self.parts();
            view_manager.get_element(&mut cx, index, force_create, suppress)
        };
        self.drain_viewport_requests();
        element
    }

    fn recycle_element(&mut self, element: ElementId) {
        let held = self
            .registry
            .info(element)
            .is_some_and(|i| i.is_held_by_layout());
        assert!(held, "layout recycled {element:?}, which it does not hold");
        self.clear_element_impl(element);
        self.drain_viewport_requests();
    }

    fn realization_rect(&self) -> Rect {
        self.viewport_manager.layout_realization_window()
    }

    fn visible_rect(&self) -> Rect {
        self.viewport_manager.layout_visible_window()
    }

    fn recommended_anchor_index(&self) -> Option<usize> {
        let anchor = self.suggested_anchor()?;
        self.view_manager
            .element_index(&self.registry, anchor)
            .ok()
            .flatten()
    }

    fn layout_origin(&self) -> Point {
        self.layout_origin
    }

    fn set_layout_origin(&mut self, origin: Point) {
        self.layout_origin = origin;
    }

    fn arrange_element(&mut self, element: ElementId, bounds: Rect) {
        let slot = bounds.translate(-self.layout_origin.x, -self.layout_origin.y);
        self.registry.set_layout_slot(element, Some(slot));
    }

    fn invalidate_measure(&mut self) {
        self.measure_invalid = true;
    }
}

/// Checks a change against the post-change item count.
fn validate_change(change: &CollectionChange, count: usize) -> Result<(), RepeaterError> {
    let fits = match *change {
        CollectionChange::Add { index, count: added } => index + added <= count,
        CollectionChange::Remove { index, .. } => index <= count,
        CollectionChange::Replace {
            index,
            old_count,
            new_count,
        } => {
            if old_count == 0 || new_count == 0 {
                return Err(RepeaterError::InvalidCollectionChange(
                    "replace needs old and new items",
                ));
            }
            index + new_count <= count
        }
        CollectionChange::Move {
            old_index,
            new_index,
            count: moved,
        } => old_index + moved <= count && new_index + moved <= count,
        CollectionChange::Reset => true,
    };
    if fits {
        Ok(())
    } else {
        Err(RepeaterError::InvalidCollectionChange(
            "change does not fit the items source",
        ))
    }
}
