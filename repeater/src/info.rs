use alloc::string::String;

use crate::{ElementOwner, Rect};

/// Per-element bookkeeping, kept for as long as the element is reused.
///
/// Recycled elements keep their record; it is reinitialized each time the element comes back
/// from the factory.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualizationInfo {
    index: Option<usize>,
    owner: ElementOwner,
    pin_count: u32,
    unique_id: String,
    auto_recycle_candidate: bool,
    keep_alive: bool,
    can_be_scroll_anchor: bool,
    must_clear_data_context: bool,
    arrange_bounds: Option<Rect>,
    phase: Option<u32>,
}

impl Default for VirtualizationInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualizationInfo {
    pub(crate) fn new() -> Self {
        Self {
            index: None,
            owner: ElementOwner::ElementFactory,
            pin_count: 0,
            unique_id: String::new(),
            auto_recycle_candidate: false,
            keep_alive: false,
            can_be_scroll_anchor: false,
            must_clear_data_context: false,
            arrange_bounds: None,
            phase: None,
        }
    }

    /// Current data index; `None` while the element is not bound to an item.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn owner(&self) -> ElementOwner {
        self.owner
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    /// Stable key from the items source, empty when the source has no key mapping.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn auto_recycle_candidate(&self) -> bool {
        self.auto_recycle_candidate
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn can_be_scroll_anchor(&self) -> bool {
        self.can_be_scroll_anchor
    }

    pub fn must_clear_data_context(&self) -> bool {
        self.must_clear_data_context
    }

    /// Bounds from the last arrange pass, `None` until the element is arranged.
    pub fn arrange_bounds(&self) -> Option<Rect> {
        self.arrange_bounds
    }

    /// Next pending phase for incremental preparation.
    pub fn phase(&self) -> Option<u32> {
        self.phase
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    pub fn is_held_by_layout(&self) -> bool {
        self.owner == ElementOwner::Layout
    }

    pub fn is_realized(&self) -> bool {
        self.is_held_by_layout() || self.owner == ElementOwner::PinnedPool
    }

    pub fn is_in_unique_id_reset_pool(&self) -> bool {
        self.owner == ElementOwner::UniqueIdResetPool
    }

    pub(crate) fn set_auto_recycle_candidate(&mut self, value: bool) {
        self.auto_recycle_candidate = value;
    }

    pub(crate) fn set_keep_alive(&mut self, value: bool) {
        self.keep_alive = value;
    }

    pub(crate) fn set_can_be_scroll_anchor(&mut self, value: bool) {
        self.can_be_scroll_anchor = value;
    }

    pub(crate) fn set_must_clear_data_context(&mut self, value: bool) {
        self.must_clear_data_context = value;
    }

    pub(crate) fn set_arrange_bounds(&mut self, bounds: Option<Rect>) {
        self.arrange_bounds = bounds;
    }

    pub(crate) fn set_phase(&mut self, phase: Option<u32>) {
        self.phase = phase;
    }

    pub(crate) fn update_index(&mut self, index: usize) {
        assert!(
            self.is_realized() || self.is_in_unique_id_reset_pool(),
            "index updated on an element owned by {:?}",
            self.owner
        );
        self.index = Some(index);
    }

    pub(crate) fn add_pin(&mut self) -> Result<u32, crate::RepeaterError> {
        if !self.is_realized() {
            return Err(crate::RepeaterError::PinUnrealized);
        }
        self.pin_count += 1;
        Ok(self.pin_count)
    }

    pub(crate) fn remove_pin(&mut self) -> Result<u32, crate::RepeaterError> {
        if !self.is_realized() {
            return Err(crate::RepeaterError::PinUnrealized);
        }
        if !self.is_pinned() {
            return Err(crate::RepeaterError::UnbalancedUnpin);
        }
        self.pin_count -= 1;
        Ok(self.pin_count)
    }

    pub(crate) fn move_ownership_to_layout_from_element_factory(
        &mut self,
        index: usize,
        unique_id: String,
    ) {
        assert_eq!(
            self.owner,
            ElementOwner::ElementFactory,
            "factory handed out an element it does not own"
        );
        self.owner = ElementOwner::Layout;
        self.index = Some(index);
        self.unique_id = unique_id;
    }

    pub(crate) fn move_ownership_to_layout_from_unique_id_reset_pool(&mut self) {
        assert_eq!(self.owner, ElementOwner::UniqueIdResetPool);
        self.owner = ElementOwner::Layout;
    }

    pub(crate) fn move_ownership_to_layout_from_pinned_pool(&mut self) {
        assert_eq!(self.owner, ElementOwner::PinnedPool);
        self.owner = ElementOwner::Layout;
    }

    pub(crate) fn move_ownership_to_element_factory(&mut self) {
        assert_ne!(
            self.owner,
            ElementOwner::ElementFactory,
            "element already belongs to the factory"
        );
        self.owner = ElementOwner::ElementFactory;
        self.pin_count = 0;
        self.index = None;
        self.unique_id.clear();
        self.arrange_bounds = None;
        self.keep_alive = false;
        self.auto_recycle_candidate = false;
    }

    /// Keeps the pin count: an element that survives the reset stays pinned.
    pub(crate) fn move_ownership_to_unique_id_reset_pool(&mut self) {
        assert!(
            matches!(self.owner, ElementOwner::Layout | ElementOwner::PinnedPool),
            "element owned by {:?} cannot be parked for a reset",
            self.owner
        );
        self.owner = ElementOwner::UniqueIdResetPool;
    }

    /// Elements dropped from the reset pool go to the animator too, not only layout-held ones.
    pub(crate) fn move_ownership_to_animator(&mut self) {
        assert!(
            matches!(
                self.owner,
                ElementOwner::Layout | ElementOwner::UniqueIdResetPool
            ),
            "element owned by {:?} cannot be handed to the animator",
            self.owner
        );
        self.owner = ElementOwner::Animator;
        self.index = None;
        self.pin_count = 0;
    }

    pub(crate) fn move_ownership_to_pinned_pool(&mut self) {
        assert_eq!(self.owner, ElementOwner::Layout);
        self.owner = ElementOwner::PinnedPool;
    }

    /// A pinned element the layout did not reclaim after a reset.
    pub(crate) fn move_ownership_to_pinned_pool_from_unique_id_reset_pool(&mut self) {
        assert_eq!(self.owner, ElementOwner::UniqueIdResetPool);
        assert!(self.is_pinned(), "only pinned elements return to the pinned pool");
        self.owner = ElementOwner::PinnedPool;
    }
}
