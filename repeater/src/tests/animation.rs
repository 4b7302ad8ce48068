use super::mocks::{AnimatorLog, MockAnimator};
use super::*;

fn with_animator(h: &mut Harness, configure: impl FnOnce(&mut AnimatorLog)) -> MockAnimator {
    let animator = MockAnimator::default();
    configure(&mut animator.log.borrow_mut());
    h.repeater
        .set_animator(Some(alloc::boxed::Box::new(animator.clone())));
    animator
}

#[test]
fn hide_animation_defers_recycling_until_completed() {
    let mut h = Harness::new(50, false, viewport_at(0.0, 50.0));
    let animator = with_animator(&mut h, |log| log.hide = true);
    let removed = h.element_at(2);

    h.repeater.items_source_mut().remove(2, 1);
    h.apply(CollectionChange::Remove { index: 2, count: 1 });

    assert_eq!(h.info(removed).owner(), ElementOwner::Animator);
    assert_eq!(h.info(removed).index(), None);
    assert!(!h.factory.borrow().recycled.contains(&removed));
    assert_eq!(
        animator.log.borrow().hide_queries.last(),
        Some(&AnimationContext::COLLECTION_CHANGE_REMOVE)
    );

    h.layout_pass();
    // Queued, not started, until the rendering tick.
    assert!(animator.log.borrow().started_hides.is_empty());
    assert!(h.repeater.needs_rendering());
    h.repeater.on_rendering(&h.clock);
    assert_eq!(
        animator.log.borrow().started_hides,
        alloc::vec![(removed, AnimationContext::COLLECTION_CHANGE_REMOVE)]
    );

    h.repeater.on_hide_animation_completed(removed).unwrap();
    assert_eq!(h.info(removed).owner(), ElementOwner::ElementFactory);
    assert!(h.factory.borrow().recycled.contains(&removed));

    // A late duplicate notification is ignored.
    h.repeater.on_hide_animation_completed(removed).unwrap();
    assert_eq!(
        h.repeater.on_hide_animation_completed(ElementId(4242)),
        Err(RepeaterError::NotAChild)
    );
    h.layout_pass();
    h.assert_consistent();
}

#[test]
fn show_animations_start_on_the_next_rendering_tick() {
    let mut h = Harness::new(50, false, viewport_at(0.0, 50.0));
    h.factory.borrow_mut().discard = true;
    let animator = with_animator(&mut h, |log| log.show = true);

    h.scroll_to(300.0);
    assert!(animator.log.borrow().started_shows.is_empty());

    // Elements that leave before the tick are not animated.
    h.scroll_to(600.0);
    h.repeater.on_rendering(&h.clock);

    let started: Vec<ElementId> = animator
        .log
        .borrow()
        .started_shows
        .iter()
        .map(|&(e, _)| e)
        .collect();
    let mut held: Vec<ElementId> = h.held().into_iter().map(|(_, e)| e).collect();
    let mut started_sorted = started.clone();
    started_sorted.sort();
    held.sort();
    assert_eq!(started_sorted, held);
    assert!(!h.repeater.animation_manager().has_pending_animations());
}

#[test]
fn show_context_reports_the_change_that_realized_the_element() {
    let mut h = Harness::new(50, false, viewport_at(0.0, 50.0));
    let animator = with_animator(&mut h, |log| log.show = true);

    h.repeater.items_source_mut().insert(1, 1);
    h.apply(CollectionChange::Add { index: 1, count: 1 });
    h.layout_pass();
    h.repeater.on_rendering(&h.clock);

    let added = h.element_at(1);
    let log = animator.log.borrow();
    assert!(log
        .started_shows
        .contains(&(added, AnimationContext::COLLECTION_CHANGE_ADD)));
}

#[test]
fn bounds_change_animation_follows_shifted_elements() {
    let mut h = Harness::new(50, false, viewport_at(0.0, 50.0));
    let animator = with_animator(&mut h, |log| log.bounds = true);
    let first = h.element_at(0);

    h.repeater.items_source_mut().insert(0, 1);
    h.apply(CollectionChange::Add { index: 0, count: 1 });
    h.layout_pass();
    assert!(animator.log.borrow().started_bounds.is_empty());

    h.repeater.on_rendering(&h.clock);
    let row = |i: f64| Rect::new(0.0, i * ITEM_EXTENT, ITEM_WIDTH, ITEM_EXTENT);
    assert!(animator
        .log
        .borrow()
        .started_bounds
        .contains(&(first, row(0.0), row(1.0))));
}

#[test]
fn no_animator_means_immediate_recycling() {
    let mut h = Harness::new(50, false, viewport_at(0.0, 50.0));
    let removed = h.element_at(2);
    h.repeater.items_source_mut().remove(2, 1);
    h.apply(CollectionChange::Remove { index: 2, count: 1 });
    assert_eq!(h.info(removed).owner(), ElementOwner::ElementFactory);
    assert!(h.factory.borrow().recycled.contains(&removed));
    assert!(!h.repeater.animation_manager().has_pending_animations());
}
