use core::ops::{BitOr, BitOrAssign};

/// A point in layout or repeater coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub const fn infinite() -> Self {
        Self {
            width: f64::INFINITY,
            height: f64::INFINITY,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// A window that covers the whole layout space. Contexts reporting it are non-virtualizing.
    pub const fn infinite() -> Self {
        Self::new(f64::MIN / 4.0, f64::MIN / 4.0, f64::INFINITY, f64::INFINITY)
    }

    pub fn is_infinite(&self) -> bool {
        self.width.is_infinite() || self.height.is_infinite()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Start of the rect along the scrolling axis.
    pub fn main_start(&self, orientation: ScrollOrientation) -> f64 {
        match orientation {
            ScrollOrientation::Vertical => self.y,
            ScrollOrientation::Horizontal => self.x,
        }
    }

    /// Extent of the rect along the scrolling axis.
    pub fn main_extent(&self, orientation: ScrollOrientation) -> f64 {
        match orientation {
            ScrollOrientation::Vertical => self.height,
            ScrollOrientation::Horizontal => self.width,
        }
    }

    pub fn main_end(&self, orientation: ScrollOrientation) -> f64 {
        self.main_start(orientation) + self.main_extent(orientation)
    }

    /// Edge-inclusive overlap along a single axis.
    pub fn intersects_along(&self, other: &Rect, orientation: ScrollOrientation) -> bool {
        self.main_end(orientation) >= other.main_start(orientation)
            && self.main_start(orientation) <= other.main_end(orientation)
    }

    /// Edge-inclusive overlap of two non-empty rects.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 || other.width <= 0.0 || other.height <= 0.0 {
            return false;
        }
        other.x <= self.right()
            && other.right() >= self.x
            && other.y <= self.bottom()
            && other.bottom() >= self.y
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollOrientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Handle to a visual element minted by an [`crate::ElementFactory`].
///
/// The engine never creates or destroys the visual behind a handle; it only tracks who owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

/// The single party that currently owns an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementOwner {
    ElementFactory,
    Layout,
    PinnedPool,
    UniqueIdResetPool,
    Animator,
}

/// A structural change in the items source.
///
/// Indexes follow observable-collection conventions: `Add`/`Remove` indexes are positions in the
/// collection before the change is applied, `Move` indexes are the old and new positions of the
/// moved block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollectionChange {
    Add {
        index: usize,
        count: usize,
    },
    Remove {
        index: usize,
        count: usize,
    },
    Replace {
        index: usize,
        old_count: usize,
        new_count: usize,
    },
    Move {
        old_index: usize,
        new_index: usize,
        count: usize,
    },
    Reset,
}

impl CollectionChange {
    /// Clearing an element while processing a change of this kind ignores pins.
    pub(crate) fn forces_clear(&self) -> bool {
        matches!(
            self,
            Self::Remove { .. } | Self::Replace { .. } | Self::Reset
        )
    }

    /// Maps an index from before the change to after it.
    ///
    /// Returns `None` for indexes whose item was removed or replaced.
    pub fn remap_index(&self, index: usize) -> Option<usize> {
        match *self {
            Self::Add { index: at, count } => Some(if index >= at { index + count } else { index }),
            Self::Remove { index: at, count } => {
                if index < at {
                    Some(index)
                } else if index < at + count {
                    None
                } else {
                    Some(index - count)
                }
            }
            Self::Replace {
                index: at,
                old_count,
                new_count,
            } => {
                if index < at {
                    Some(index)
                } else if index < at + old_count {
                    None
                } else {
                    Some(index - old_count + new_count)
                }
            }
            Self::Move {
                old_index,
                new_index,
                count,
            } => {
                if index >= old_index && index < old_index + count {
                    return Some(new_index + (index - old_index));
                }
                let without = if index >= old_index + count {
                    index - count
                } else {
                    index
                };
                Some(if without >= new_index {
                    without + count
                } else {
                    without
                })
            }
            Self::Reset => None,
        }
    }
}

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr;)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u8);

        impl $name {
            pub const NONE: Self = Self(0);
            $($(#[$fmeta])* pub const $flag: Self = Self($bit);)*

            pub const fn bits(self) -> u8 {
                self.0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

flag_set! {
    /// Which change categories happened since the last arrange, as seen by an animator.
    AnimationContext {
        COLLECTION_CHANGE_ADD = 1;
        COLLECTION_CHANGE_REMOVE = 2;
        COLLECTION_CHANGE_RESET = 4;
        LAYOUT_TRANSITION = 8;
    }
}

flag_set! {
    /// Options a layout passes when asking for an element.
    ElementRealizationOptions {
        /// Skip the lookup among elements already held by the layout.
        FORCE_CREATE = 1;
        /// The layout tracks the element itself; do not sweep it after measure.
        SUPPRESS_AUTO_RECYCLE = 2;
    }
}
