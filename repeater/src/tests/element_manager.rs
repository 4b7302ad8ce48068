use super::mocks::TestContext;
use super::*;

fn row(index: usize) -> Rect {
    Rect::new(0.0, index as f64 * ITEM_EXTENT, ITEM_WIDTH, ITEM_EXTENT)
}

/// Realizes `first..=last` with stacked row bounds.
fn realize(manager: &mut ElementManager, ctx: &mut TestContext, first: usize, last: usize) {
    manager.on_begin_measure(ctx);
    for index in first..=last {
        manager.ensure_element_realized(ctx, true, index);
        manager.set_layout_bounds_for_data_index(index, row(index));
    }
}

fn range(manager: &ElementManager) -> (Option<usize>, Option<usize>) {
    (manager.first_realized_index(), manager.last_realized_index())
}

#[test]
fn remove_before_range_shifts_without_recycling() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);
    let before: Vec<ElementId> = manager.realized_elements().map(|(_, e)| e).collect();

    ctx.count = 48;
    manager.data_source_changed(&mut ctx, &CollectionChange::Remove { index: 3, count: 2 });

    assert_eq!(range(&manager), (Some(3), Some(8)));
    assert!(ctx.recycled.is_empty());
    let after: Vec<ElementId> = manager.realized_elements().map(|(_, e)| e).collect();
    assert_eq!(before, after);
}

#[test]
fn remove_overlapping_front_recycles_overlap() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);
    let at_7 = manager.realized_element(7).unwrap();

    // Removes data indices 3..=6; 5 and 6 were realized.
    ctx.count = 46;
    manager.data_source_changed(&mut ctx, &CollectionChange::Remove { index: 3, count: 4 });

    assert_eq!(ctx.recycled.len(), 2);
    assert_eq!(range(&manager), (Some(3), Some(6)));
    assert_eq!(manager.realized_element(3), Some(at_7));
}

#[test]
fn remove_inside_range_keeps_first_index() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);
    let at_9 = manager.realized_element(9).unwrap();

    ctx.count = 48;
    manager.data_source_changed(&mut ctx, &CollectionChange::Remove { index: 7, count: 2 });

    assert_eq!(ctx.recycled.len(), 2);
    assert_eq!(range(&manager), (Some(5), Some(8)));
    assert_eq!(manager.realized_element(7), Some(at_9));
}

#[test]
fn add_inside_range_inserts_sentinels() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);
    let held_before = ctx.held.len();

    ctx.count = 53;
    manager.data_source_changed(&mut ctx, &CollectionChange::Add { index: 7, count: 3 });

    assert_eq!(range(&manager), (Some(5), Some(13)));
    assert_eq!(manager.realized_element(7), None);
    assert_eq!(manager.realized_element(9), None);
    assert!(manager.realized_element(10).is_some());
    // Sentinels do not create elements until the layout asks for them.
    assert_eq!(ctx.held.len(), held_before);

    let realized_index = manager.realized_index_from_data_index(8);
    let element = manager.get_at(&mut ctx, realized_index);
    assert_eq!(manager.realized_element(8), Some(element));
    assert_eq!(ctx.held.last(), Some(&(element, 8)));
}

#[test]
fn add_before_and_after_range() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);

    ctx.count = 52;
    manager.data_source_changed(&mut ctx, &CollectionChange::Add { index: 5, count: 2 });
    assert_eq!(range(&manager), (Some(7), Some(12)));

    ctx.count = 54;
    manager.data_source_changed(&mut ctx, &CollectionChange::Add { index: 13, count: 2 });
    assert_eq!(range(&manager), (Some(7), Some(12)));
}

#[test]
fn trimming_keeps_one_past_each_end_and_is_idempotent() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 0.0, ITEM_WIDTH, 1000.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 0, 19);

    // Rows 5..=10 touch the window; rows 4 and 11 survive as the one-past elements.
    let window = Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0);
    manager.discard_elements_outside_window(&mut ctx, window, ScrollOrientation::Vertical);
    assert_eq!(range(&manager), (Some(4), Some(11)));
    assert_eq!(ctx.recycled.len(), 12);

    let recycled = ctx.recycled.len();
    manager.discard_elements_outside_window(&mut ctx, window, ScrollOrientation::Vertical);
    assert_eq!(range(&manager), (Some(4), Some(11)));
    assert_eq!(ctx.recycled.len(), recycled);
}

#[test]
fn trimming_everything_when_window_moved_away() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 0.0, ITEM_WIDTH, 1000.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 0, 5);

    let window = Rect::new(0.0, 300.0, ITEM_WIDTH, 50.0);
    manager.discard_elements_outside_window(&mut ctx, window, ScrollOrientation::Vertical);
    // Both runs cover every slot; nothing borders the window, so nothing is kept.
    assert_eq!(range(&manager), (None, None));
    assert_eq!(ctx.recycled.len(), 6);
    assert!(!manager.is_window_connected(window, ScrollOrientation::Vertical));
}

#[test]
fn replace_with_equal_count_recycles_in_place() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);
    let at_5 = manager.realized_element(5).unwrap();
    let at_8 = manager.realized_element(8).unwrap();

    manager.data_source_changed(
        &mut ctx,
        &CollectionChange::Replace {
            index: 6,
            old_count: 2,
            new_count: 2,
        },
    );

    assert_eq!(ctx.recycled.len(), 2);
    assert_eq!(range(&manager), (Some(5), Some(10)));
    assert_eq!(manager.realized_element(5), Some(at_5));
    assert_eq!(manager.realized_element(6), None);
    assert_eq!(manager.realized_element(7), None);
    assert_eq!(manager.realized_element(8), Some(at_8));
}

#[test]
fn move_is_remove_then_insert() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);
    let at_9 = manager.realized_element(9).unwrap();

    // Item 6 moves to position 8 (post-removal coordinates).
    manager.data_source_changed(
        &mut ctx,
        &CollectionChange::Move {
            old_index: 6,
            new_index: 8,
            count: 1,
        },
    );

    assert_eq!(ctx.recycled.len(), 1);
    assert_eq!(range(&manager), (Some(5), Some(10)));
    assert_eq!(manager.realized_element(8), None);
    assert_eq!(manager.realized_element(9), Some(at_9));
}

#[test]
fn reset_clears_the_range() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);

    manager.data_source_changed(&mut ctx, &CollectionChange::Reset);

    assert_eq!(range(&manager), (None, None));
    assert_eq!(ctx.recycled.len(), 6);
    assert!(ctx.held.is_empty());
}

#[test]
fn non_virtualizing_context_indexes_identity() {
    let mut ctx = TestContext::new(4, Rect::infinite());
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    manager.on_begin_measure(&mut ctx);

    assert!(!manager.is_virtualizing_context());
    assert_eq!(manager.realized_element_count(&ctx), 4);
    assert_eq!(range(&manager), (Some(0), Some(3)));
    assert_eq!(manager.data_index_from_realized_index(2), 2);

    let element = manager.get_at(&mut ctx, 2);
    assert_eq!(ctx.held, alloc::vec![(element, 2)]);

    // Changes are left to the repeater when nothing is virtualized.
    manager.data_source_changed(&mut ctx, &CollectionChange::Reset);
    assert!(ctx.recycled.is_empty());
}

#[test]
fn discard_from_index_in_both_directions() {
    let mut ctx = TestContext::new(50, Rect::new(0.0, 55.0, ITEM_WIDTH, 50.0));
    let mut manager = ElementManager::new(ScrollOrientation::Vertical);
    realize(&mut manager, &mut ctx, 5, 10);

    manager.discard_elements_from(&mut ctx, true, 9);
    assert_eq!(range(&manager), (Some(5), Some(8)));

    manager.discard_elements_from(&mut ctx, false, 6);
    assert_eq!(range(&manager), (Some(7), Some(8)));
    assert_eq!(ctx.recycled.len(), 4);
}
