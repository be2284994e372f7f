// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reorderable containers: lists whose entries are both drag sources and
//! drop positions.
//!
//! [`Reorder`] is measured from the bounds of the container's entries, in
//! item order. It picks the axis the entries are laid out along, then maps
//! pointer positions to insertion indices: the first entry whose center is at
//! or beyond the pointer on that axis, or the end of the list.
//!
//! ## Axis detection
//!
//! Entries of a horizontal row share their top edge; entries of a vertical
//! column share their left edge. The axis with more entries sharing a
//! leading edge is the cross axis, and sorting happens along the other one.
//! Ties sort vertically.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_dnd_state::reorder::{Axis, Reorder};
//!
//! // A column of three rows, 20 high.
//! let rows: Vec<Rect> = (0..3)
//!     .map(|i| Rect::new(0.0, 20.0 * f64::from(i), 100.0, 20.0 * f64::from(i) + 20.0))
//!     .collect();
//! let reorder = Reorder::measure(&rows);
//! assert_eq!(reorder.axis(), Axis::Y);
//!
//! let mut items = vec!["a", "b", "c"];
//! let index = reorder.insert(&mut items, Point::new(50.0, 25.0), "new");
//! assert_eq!(index, 1);
//! assert_eq!(items, ["a", "new", "b", "c"]);
//! ```

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use tracing::trace;

/// The axis entries are sorted along.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left to right.
    X,
    /// Top to bottom.
    #[default]
    Y,
}

impl Axis {
    /// The coordinate of `point` along this axis.
    #[must_use]
    pub fn of(self, point: Point) -> f64 {
        match self {
            Self::X => point.x,
            Self::Y => point.y,
        }
    }
}

/// What a drop does to the dragged entry's own list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DropMode {
    /// The entry leaves its list.
    #[default]
    Move,
    /// The entry stays; the target receives a copy.
    Copy,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Slot {
    /// Index in item order.
    index: usize,
    center: Point,
}

/// Insertion positions of one container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reorder {
    axis: Axis,
    /// Sorted by center along `axis`.
    slots: Vec<Slot>,
    /// Insertion index of the latest [`hover`](Self::hover).
    hovered: Option<usize>,
}

/// Largest number of entries sharing one leading edge coordinate.
fn max_shared(edges: impl Iterator<Item = f64>) -> usize {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for edge in edges {
        // Fold -0.0 into 0.0 so both count as one edge.
        *counts.entry((edge + 0.0).to_bits()).or_default() += 1;
    }
    counts.values().copied().max().unwrap_or(0)
}

impl Reorder {
    /// Measures a container from its entries' bounds, given in item order.
    pub fn measure(bounds: &[Rect]) -> Self {
        let shared_left = max_shared(bounds.iter().map(|b| b.x0));
        let shared_top = max_shared(bounds.iter().map(|b| b.y0));
        let axis = if shared_left < shared_top {
            Axis::X
        } else {
            Axis::Y
        };
        let mut slots: Vec<Slot> = bounds
            .iter()
            .enumerate()
            .map(|(index, b)| Slot {
                index,
                center: b.center(),
            })
            .collect();
        slots.sort_by(|a, b| axis.of(a.center).total_cmp(&axis.of(b.center)));
        trace!(?axis, entries = slots.len(), "container measured");
        Self {
            axis,
            slots,
            hovered: None,
        }
    }

    /// The sort axis.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of measured entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no entries were measured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Item indices in visual order.
    pub fn visual_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|slot| slot.index)
    }

    /// Where an entry dropped at `pointer` goes, as an item index.
    ///
    /// Equal to [`len`](Self::len) when it goes after every entry.
    #[must_use]
    pub fn insertion_index(&self, pointer: Point) -> usize {
        let at = self.axis.of(pointer);
        self.slots
            .iter()
            .find(|slot| at <= self.axis.of(slot.center))
            .map_or(self.slots.len(), |slot| slot.index)
    }

    /// Tracks a hovering drag. Returns the insertion index when it differs
    /// from the previous hover.
    pub fn hover(&mut self, pointer: Point) -> Option<usize> {
        let index = self.insertion_index(pointer);
        if self.hovered == Some(index) {
            return None;
        }
        self.hovered = Some(index);
        Some(index)
    }

    /// Forgets the hover, for example when the drag leaves the container.
    pub fn end_hover(&mut self) {
        self.hovered = None;
    }

    /// Inserts an entry dropped at `pointer`. Returns its index.
    pub fn insert<T>(&self, items: &mut Vec<T>, pointer: Point, item: T) -> usize {
        let index = self.insertion_index(pointer).min(items.len());
        items.insert(index, item);
        index
    }

    /// Moves the entry at `from` to where `pointer` points, within the same
    /// list. Returns its new index, or `None` if `from` is out of range.
    pub fn move_within<T>(&self, items: &mut Vec<T>, from: usize, pointer: Point) -> Option<usize> {
        if from >= items.len() {
            return None;
        }
        let target = self.insertion_index(pointer);
        let item = items.remove(from);
        let to = (if target > from { target - 1 } else { target }).min(items.len());
        items.insert(to, item);
        Some(to)
    }
}

/// Removes a dropped entry from its own list when `mode` is
/// [`DropMode::Move`]. Returns the removed entry.
pub fn release<T: PartialEq>(items: &mut Vec<T>, item: &T, mode: DropMode) -> Option<T> {
    if mode == DropMode::Copy {
        return None;
    }
    let index = items.iter().position(|entry| entry == item)?;
    Some(items.remove(index))
}
