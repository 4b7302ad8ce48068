use alloc::string::String;
use alloc::vec::Vec;

use crate::key::UniqueIdMap;
use crate::registry::ElementRegistry;
use crate::repeater::RepeaterCx;
use crate::source::{GetElementArgs, RecycleElementArgs};
use crate::{
    CollectionChange, ElementId, ElementOwner, ItemsSource, Recycled, RepeaterError,
    RepeaterEvent,
};

/// Element lifecycle state machine.
///
/// Decides where an element comes from when the layout asks for an index, and where it goes when
/// the layout lets it go:
///
/// ```text
/// ElementFactory -> Layout -> { PinnedPool | UniqueIdResetPool | Animator } -> Layout | ElementFactory
/// ```
///
/// It also keeps realized indices in step with collection changes and tracks the focused
/// element.
#[derive(Clone, Debug, Default)]
pub struct ViewManager {
    pinned_pool: Vec<ElementId>,
    reset_pool: UniqueIdMap<ElementId>,
    is_data_source_stable_reset_pending: bool,
    /// Bounds on the indices held by the layout; `None` when unknown.
    held_range: Option<(usize, usize)>,
    last_focused: Option<ElementId>,
}

impl ViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinned_pool(&self) -> &[ElementId] {
        &self.pinned_pool
    }

    pub fn reset_pool_len(&self) -> usize {
        self.reset_pool.len()
    }

    pub fn is_stable_reset_pending(&self) -> bool {
        self.is_data_source_stable_reset_pending
    }

    pub fn last_focused(&self) -> Option<ElementId> {
        self.last_focused
    }

    pub(crate) fn get_element<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        index: usize,
        force_create: bool,
        suppress_auto_recycle: bool,
    ) -> ElementId {
        let mut element = if force_create {
            None
        } else {
            self.get_element_if_already_held_by_layout(cx.registry, index)
        };
        if element.is_none() {
            element = self.get_element_from_made_anchor(cx, index);
        }
        if element.is_none() {
            element = self.get_element_from_unique_id_reset_pool(cx, index);
        }
        if element.is_none() {
            element = self.get_element_from_pinned_pool(cx, index);
        }
        let element = match element {
            Some(element) => element,
            None => self.get_element_from_element_factory(cx, index),
        };

        let info = cx.registry.expect_info_mut(element);
        if suppress_auto_recycle {
            info.set_auto_recycle_candidate(false);
        } else {
            info.set_auto_recycle_candidate(true);
            info.set_keep_alive(true);
        }
        element
    }

    /// Lets go of `element`, trying the reset pool, the animator and the pinned pool before the
    /// factory. `forced` is set for clears caused by a removing collection change; such clears
    /// never park pinned elements.
    pub(crate) fn clear_element<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
        forced: bool,
    ) {
        let info = cx.registry.expect_info(element);
        let index = info.index();
        let owner = info.owner();
        rtrace!(element = element.0, ?index, ?owner, forced, "ViewManager::clear_element");

        let cleared = (matches!(owner, ElementOwner::Layout | ElementOwner::PinnedPool)
            && self.clear_element_to_unique_id_reset_pool(cx, element))
            || (matches!(
                owner,
                ElementOwner::Layout | ElementOwner::UniqueIdResetPool
            ) && self.clear_element_to_animator(cx, element))
            || (!forced
                && owner == ElementOwner::Layout
                && self.clear_element_to_pinned_pool(cx, element));
        if !cleared {
            self.clear_element_to_element_factory(cx, element);
        }

        if let (Some(index), Some((first, last))) = (index, self.held_range) {
            if index == first && index == last {
                self.held_range = None;
            } else if index == first {
                self.held_range = Some((first + 1, last));
            } else if index == last {
                self.held_range = Some((first, last - 1));
            }
        }
    }

    /// Hands an element back to the factory, dropping its registry record if the factory
    /// discards it.
    pub(crate) fn clear_element_to_element_factory<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
    ) {
        cx.raise(RepeaterEvent::ElementClearing { element });
        cx.phaser.stop_phasing(cx.registry, element);

        let info = cx.registry.expect_info_mut(element);
        let index = info.index();
        let clear_data = info.must_clear_data_context();
        info.move_ownership_to_element_factory();
        self.pinned_pool.retain(|&e| e != element);

        let outcome = cx.factory.recycle_element(RecycleElementArgs {
            element,
            clear_data,
        });
        rtrace!(element = element.0, ?outcome, "element returned to factory");
        if outcome == Recycled::Discarded {
            cx.registry.remove(element);
        }

        if self.last_focused == Some(element) {
            self.move_focus_from_cleared_index(cx, index);
        }
    }

    /// Returns pinned-pool elements that lost their last pin to the factory.
    pub(crate) fn prune_pinned_elements<S: ItemsSource>(&mut self, cx: &mut RepeaterCx<'_, S>) {
        let unpinned: Vec<ElementId> = self
            .pinned_pool
            .iter()
            .copied()
            .filter(|&e| !cx.registry.expect_info(e).is_pinned())
            .collect();
        for element in unpinned {
            debug_assert_eq!(
                cx.registry.expect_info(element).owner(),
                ElementOwner::PinnedPool
            );
            self.clear_element_to_element_factory(cx, element);
        }
    }

    pub(crate) fn update_pin<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
        add: bool,
    ) -> Result<(), RepeaterError> {
        let info = cx.registry.info_mut(element).ok_or(RepeaterError::NotAChild)?;
        if add {
            info.add_pin()?;
        } else if info.remove_pin()? == 0 && !info.is_held_by_layout() {
            // Swept by the next measure pass instead of mutating mid-handler.
            cx.invalidate_measure();
        }
        Ok(())
    }

    /// Pins the newly focused element and unpins the previous one.
    pub(crate) fn update_focused_element<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        focused: Option<ElementId>,
    ) -> Result<(), RepeaterError> {
        if self.last_focused == focused {
            return Ok(());
        }
        if let Some(element) = focused {
            let info = cx.registry.info(element).ok_or(RepeaterError::NotAChild)?;
            if !info.is_realized() {
                return Err(RepeaterError::PinUnrealized);
            }
        }
        if let Some(previous) = self.last_focused {
            let still_pinned = cx
                .registry
                .info(previous)
                .is_some_and(|i| i.is_realized() && i.is_pinned());
            if still_pinned {
                self.update_pin(cx, previous, false)?;
            }
        }
        if let Some(element) = focused {
            self.update_pin(cx, element, true)?;
        }
        self.last_focused = focused;
        Ok(())
    }

    /// Index of a realized or reset-pooled element.
    pub(crate) fn element_index(
        &self,
        registry: &ElementRegistry,
        element: ElementId,
    ) -> Result<Option<usize>, RepeaterError> {
        let info = registry.info(element).ok_or(RepeaterError::NotAChild)?;
        if info.is_realized() || info.is_in_unique_id_reset_pool() {
            Ok(info.index())
        } else {
            Ok(None)
        }
    }

    pub(crate) fn on_items_source_changed<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        change: &CollectionChange,
    ) -> Result<(), RepeaterError> {
        rdebug!(?change, "ViewManager::on_items_source_changed");
        match *change {
            CollectionChange::Add { index, count } => {
                self.ensure_held_range(cx.registry);
                match self.held_range {
                    Some((first, last)) if index <= last => {
                        self.held_range = Some((first, last + count));
                        self.shift_realized(cx, |i| (i >= index).then_some(i + count));
                    }
                    _ => {
                        // Indices held by layout are unaffected; pinned elements may still be.
                        let pinned = self.pinned_pool.clone();
                        for element in pinned {
                            if let Some(old) = cx.registry.expect_info(element).index() {
                                if old >= index {
                                    update_element_index(cx, element, old, old + count);
                                }
                            }
                        }
                    }
                }
            }
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
                self.clear_untracked_in_span(cx, index, old_count);
                if old_count != new_count {
                    let end = index + old_count;
                    self.shift_realized(cx, |i| {
                        (i >= end).then(|| i + new_count - old_count)
                    });
                }
                self.held_range = None;
            }
            CollectionChange::Remove { index, count } => {
                // Elements the layout tracks itself are left for the layout to recycle.
                self.clear_untracked_in_span(cx, index, count);
                let end = index + count;
                self.shift_realized(cx, |i| (i >= end).then(|| i - count));
                self.held_range = None;
            }
            CollectionChange::Move { .. } => {
                self.shift_realized(cx, |i| change.remap_index(i));
                self.held_range = None;
            }
            CollectionChange::Reset => {
                // Back-to-back resets before a layout pass clear only once.
                if !self.is_data_source_stable_reset_pending {
                    if cx.source.has_key_index_mapping() {
                        self.is_data_source_stable_reset_pending = true;
                    }
                    let stale = cx.registry.collect_children(|i| {
                        i.is_realized()
                            && (i.auto_recycle_candidate()
                                || i.owner() == ElementOwner::PinnedPool)
                    });
                    for element in stale {
                        self.clear_element_impl(cx, element, true);
                    }
                }
                self.held_range = None;
            }
        }
        Ok(())
    }

    /// A new layout will request elements again; keyed sources can reuse them by identity.
    pub(crate) fn on_layout_changing<S: ItemsSource>(&mut self, cx: &mut RepeaterCx<'_, S>) {
        if cx.source.has_key_index_mapping() {
            self.is_data_source_stable_reset_pending = true;
        }
    }

    /// Flushes the reset pool: anything the layout did not reclaim by key is cleared.
    pub(crate) fn on_owner_arranged<S: ItemsSource>(&mut self, cx: &mut RepeaterCx<'_, S>) {
        if !self.is_data_source_stable_reset_pending {
            return;
        }
        self.is_data_source_stable_reset_pending = false;
        let leftovers: Vec<ElementId> = core::mem::take(&mut self.reset_pool)
            .into_values()
            .collect();
        rdebug!(count = leftovers.len(), "flushing unique id reset pool");
        for element in leftovers {
            if !self.return_pinned_to_pinned_pool(cx, element) {
                self.clear_element(cx, element, true);
            }
        }
        self.held_range = None;
    }

    /// Full clear path used for collection changes: the element also loses anchor candidacy.
    fn clear_element_impl<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
        forced: bool,
    ) {
        cx.viewport
            .on_element_cleared(cx.registry, cx.scroll_owner.as_deref_mut(), element);
        self.clear_element(cx, element, forced);
    }

    /// Force-clears realized elements bound to `index..index + count` that no layout tracks:
    /// auto-recycle candidates and pinned-pool elements.
    fn clear_untracked_in_span<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        index: usize,
        count: usize,
    ) {
        let stale = cx.registry.collect_children(|i| {
            i.is_realized()
                && i.index().is_some_and(|x| x >= index && x < index + count)
                && (i.auto_recycle_candidate() || i.owner() == ElementOwner::PinnedPool)
        });
        for element in stale {
            self.clear_element_impl(cx, element, true);
        }
    }

    /// Applies `remap` to every realized element; `None` leaves the index untouched.
    fn shift_realized<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        remap: impl Fn(usize) -> Option<usize>,
    ) {
        let realized = cx.registry.collect_children(|i| i.is_realized());
        for element in realized {
            if let Some(old) = cx.registry.expect_info(element).index() {
                if let Some(new) = remap(old) {
                    update_element_index(cx, element, old, new);
                }
            }
        }
    }

    fn ensure_held_range(&mut self, registry: &ElementRegistry) {
        if self.held_range.is_none() {
            self.held_range = scan_held_range(registry);
        }
    }

    fn widen_held_range(&mut self, index: usize) {
        // An unknown range stays unknown; the next lookup rescans.
        if let Some((first, last)) = self.held_range {
            self.held_range = Some((first.min(index), last.max(index)));
        }
    }

    fn get_element_if_already_held_by_layout(
        &mut self,
        registry: &ElementRegistry,
        index: usize,
    ) -> Option<ElementId> {
        let cache_invalid = self.held_range.is_none();
        let in_range = self
            .held_range
            .is_some_and(|(first, last)| first <= index && index <= last);
        if !cache_invalid && !in_range {
            return None;
        }

        let mut found = None;
        let mut range: Option<(usize, usize)> = None;
        for &child in registry.children() {
            let info = registry.expect_info(child);
            if !info.is_held_by_layout() {
                continue;
            }
            let Some(child_index) = info.index() else {
                continue;
            };
            if cache_invalid {
                range = Some(match range {
                    Some((f, l)) => (f.min(child_index), l.max(child_index)),
                    None => (child_index, child_index),
                });
            }
            if child_index == index {
                found = Some(child);
                if !cache_invalid {
                    break;
                }
            }
        }
        if cache_invalid {
            self.held_range = range;
        }
        found
    }

    fn get_element_from_made_anchor<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        index: usize,
    ) -> Option<ElementId> {
        let anchor = cx.viewport.made_anchor()?;
        let info = cx.registry.info(anchor)?;
        (info.is_held_by_layout() && info.index() == Some(index)).then_some(anchor)
    }

    fn get_element_from_unique_id_reset_pool<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        index: usize,
    ) -> Option<ElementId> {
        if !self.is_data_source_stable_reset_pending {
            return None;
        }
        let key = cx.source.key_from_index(index)?;
        let element = self.reset_pool.remove(&key)?;
        rtrace!(element = element.0, index, key = key.as_str(), "reused element from reset pool");

        let info = cx.registry.expect_info_mut(element);
        info.move_ownership_to_layout_from_unique_id_reset_pool();
        match info.index() {
            Some(old) if old != index => update_element_index(cx, element, old, index),
            Some(_) => {}
            None => info.update_index(index),
        }
        cx.viewport
            .on_element_prepared(cx.registry, cx.scroll_owner.as_deref_mut(), element);
        self.widen_held_range(index);
        Some(element)
    }

    fn get_element_from_pinned_pool<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        index: usize,
    ) -> Option<ElementId> {
        let position = self
            .pinned_pool
            .iter()
            .position(|&e| cx.registry.expect_info(e).index() == Some(index))?;
        let element = self.pinned_pool.remove(position);
        rtrace!(element = element.0, index, "reused element from pinned pool");

        cx.registry
            .expect_info_mut(element)
            .move_ownership_to_layout_from_pinned_pool();
        cx.viewport
            .on_element_prepared(cx.registry, cx.scroll_owner.as_deref_mut(), element);
        self.widen_held_range(index);
        Some(element)
    }

    fn get_element_from_element_factory<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        index: usize,
    ) -> ElementId {
        let source = cx.source;
        let provided = cx.factory.get_element(GetElementArgs {
            index,
            data: source.get_at(index),
        });
        let element = provided.element;
        let unique_id = if source.has_key_index_mapping() {
            source.key_from_index(index).unwrap_or_default()
        } else {
            String::new()
        };
        rtrace!(element = element.0, index, "element created by factory");

        let (info, _) = cx.registry.get_or_create(element);
        info.set_must_clear_data_context(provided.binds_data);
        info.move_ownership_to_layout_from_element_factory(index, unique_id);

        cx.animations
            .on_element_prepared(cx.animator.as_deref(), element);
        cx.viewport
            .on_element_prepared(cx.registry, cx.scroll_owner.as_deref_mut(), element);
        if let Some(phase) = provided.phase {
            cx.phaser
                .phase_element(cx.registry, cx.scheduler, element, phase);
        }
        cx.raise(RepeaterEvent::ElementPrepared { element, index });

        self.widen_held_range(index);
        element
    }

    fn clear_element_to_unique_id_reset_pool<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
    ) -> bool {
        if !self.is_data_source_stable_reset_pending {
            return false;
        }
        let info = cx.registry.expect_info_mut(element);
        let key = info.unique_id();
        if key.is_empty() {
            return false;
        }
        if self.reset_pool.contains_key(key) {
            rwarn!(key, "duplicate unique id during reset; element not pooled");
            return false;
        }
        self.reset_pool.insert(String::from(key), element);
        if info.owner() == ElementOwner::PinnedPool {
            self.pinned_pool.retain(|&e| e != element);
        }
        info.move_ownership_to_unique_id_reset_pool();
        cx.phaser.stop_phasing(cx.registry, element);
        true
    }

    /// Puts a pinned element the layout did not reclaim back into the pinned pool, bound to
    /// the new index of its key. Fails when it is not pinned or its key is gone.
    fn return_pinned_to_pinned_pool<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
    ) -> bool {
        let info = cx.registry.expect_info(element);
        if !info.is_pinned() {
            return false;
        }
        let Some(new_index) = cx.source.index_from_key(info.unique_id()) else {
            return false;
        };
        let old_index = info.index();

        cx.registry
            .expect_info_mut(element)
            .move_ownership_to_pinned_pool_from_unique_id_reset_pool();
        match old_index {
            Some(old) => update_element_index(cx, element, old, new_index),
            None => cx.registry.expect_info_mut(element).update_index(new_index),
        }
        self.pinned_pool.push(element);
        rtrace!(element = element.0, new_index, "pinned element kept across reset");
        true
    }

    fn clear_element_to_animator<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
    ) -> bool {
        if !cx.animations.clear_element(cx.animator.as_deref(), element) {
            return false;
        }
        let info = cx.registry.expect_info_mut(element);
        let index = info.index();
        if info.is_in_unique_id_reset_pool() {
            self.reset_pool.retain(|_, &mut e| e != element);
        }
        info.move_ownership_to_animator();
        cx.phaser.stop_phasing(cx.registry, element);
        if self.last_focused == Some(element) {
            self.move_focus_from_cleared_index(cx, index);
        }
        true
    }

    fn clear_element_to_pinned_pool<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        element: ElementId,
    ) -> bool {
        let info = cx.registry.expect_info_mut(element);
        if !info.is_pinned() {
            return false;
        }
        info.move_ownership_to_pinned_pool();
        self.pinned_pool.push(element);
        rtrace!(element = element.0, "element moved to pinned pool");
        true
    }

    fn move_focus_from_cleared_index<S: ItemsSource>(
        &mut self,
        cx: &mut RepeaterCx<'_, S>,
        cleared_index: Option<usize>,
    ) {
        let candidate = cleared_index.and_then(|index| find_focus_candidate(cx.registry, index));
        match candidate {
            Some(candidate) => {
                // Pinned so the new focus target is not evicted right away.
                if cx.registry.expect_info_mut(candidate).add_pin().is_ok() {
                    self.last_focused = Some(candidate);
                    cx.raise(RepeaterEvent::FocusRequested { element: candidate });
                } else {
                    self.last_focused = None;
                }
            }
            None => {
                rwarn!(?cleared_index, "no focus candidate for cleared element");
                self.last_focused = None;
            }
        }
    }
}

/// Nearest layout-held element at or after `cleared_index`, else the nearest before it. After a
/// removal the next element takes over the cleared index, hence "at or after".
fn find_focus_candidate(registry: &ElementRegistry, cleared_index: usize) -> Option<ElementId> {
    let mut previous: Option<(usize, ElementId)> = None;
    let mut next: Option<(usize, ElementId)> = None;
    for &child in registry.children() {
        let info = registry.expect_info(child);
        if !info.is_held_by_layout() {
            continue;
        }
        let Some(index) = info.index() else { continue };
        if index < cleared_index {
            if previous.is_none_or(|(p, _)| index > p) {
                previous = Some((index, child));
            }
        } else if next.is_none_or(|(n, _)| index < n) {
            next = Some((index, child));
        }
    }
    next.or(previous).map(|(_, element)| element)
}

fn scan_held_range(registry: &ElementRegistry) -> Option<(usize, usize)> {
    registry
        .children()
        .iter()
        .filter_map(|&c| {
            let info = registry.expect_info(c);
            if info.is_held_by_layout() {
                info.index()
            } else {
                None
            }
        })
        .fold(None, |range, index| {
            Some(match range {
                Some((first, last)) => (usize::min(first, index), usize::max(last, index)),
                None => (index, index),
            })
        })
}

fn update_element_index<S: ItemsSource>(
    cx: &mut RepeaterCx<'_, S>,
    element: ElementId,
    old_index: usize,
    new_index: usize,
) {
    if old_index == new_index {
        return;
    }
    cx.registry.expect_info_mut(element).update_index(new_index);
    cx.raise(RepeaterEvent::ElementIndexChanged {
        element,
        old_index,
        new_index,
    });
}
