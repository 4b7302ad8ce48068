#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

use alloc::string::String;

use crate::ElementId;

#[cfg(feature = "std")]
pub(crate) type ElementMap<V> = HashMap<ElementId, V>;
#[cfg(not(feature = "std"))]
pub(crate) type ElementMap<V> = BTreeMap<ElementId, V>;

#[cfg(feature = "std")]
pub(crate) type UniqueIdMap<V> = HashMap<String, V>;
#[cfg(not(feature = "std"))]
pub(crate) type UniqueIdMap<V> = BTreeMap<String, V>;
