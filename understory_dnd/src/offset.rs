// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry helpers: element bounds and pointer-to-element offsets.
//!
//! All positions are viewport coordinates. Elements report their bounds through
//! [`HostElement`]; an element that is not laid out (for example detached from
//! the render tree) reports `None`, and the helpers fall back to treating the
//! pointer position as the offset.
//!
//! ```
//! use kurbo::{Point, Rect, Size, Vec2};
//! use understory_dnd::offset::source_offset;
//!
//! let bounds = Rect::new(10.0, 10.0, 110.0, 110.0);
//! let offset = source_offset(Some(bounds), Point::new(50.0, 50.0));
//! assert_eq!(offset.offset, Vec2::new(40.0, 40.0));
//! assert_eq!(offset.size, Size::new(100.0, 100.0));
//! ```

use alloc::rc::Rc;
use core::fmt;

use kurbo::{Point, Rect, Size, Vec2};

/// An element that can anchor a drag source or drop target.
///
/// This is the only thing the drag and drop core needs to know about the UI
/// toolkit's elements.
pub trait HostElement {
    /// Returns the element's bounding box in viewport coordinates, or `None`
    /// when the element currently has no layout.
    fn bounding_rect(&self) -> Option<Rect>;

    /// Marks the element as able (or no longer able) to initiate a drag.
    fn set_draggable(&self, draggable: bool) {
        let _ = draggable;
    }
}

/// Shared reference to a [`HostElement`].
pub type ElementRef = Rc<dyn HostElement>;

/// Offset of the pointer inside the dragged element, captured at drag start.
///
/// The offset is frozen for the whole gesture so previews stay anchored to the
/// spot the user grabbed, and targets receive the same value as the source.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SourceOffset {
    /// Pointer position relative to the element's top-left corner.
    pub offset: Vec2,
    /// Size of the element at drag start.
    pub size: Size,
}

impl SourceOffset {
    /// Creates an offset from its parts.
    #[must_use]
    pub const fn new(offset: Vec2, size: Size) -> Self {
        Self { offset, size }
    }

    /// Returns where the element's top-left corner sits for a pointer at `client`.
    #[must_use]
    pub fn origin_for(&self, client: Point) -> Point {
        client - self.offset
    }
}

/// Computes the frozen [`SourceOffset`] for a drag starting at `client`.
///
/// Without bounds, the pointer position itself is used as the offset and the
/// size is zero.
#[must_use]
pub fn source_offset(bounds: Option<Rect>, client: Point) -> SourceOffset {
    match bounds {
        Some(rect) => SourceOffset {
            offset: client - rect.origin(),
            size: rect.size(),
        },
        None => SourceOffset {
            offset: client.to_vec2(),
            size: Size::ZERO,
        },
    }
}

/// Computes the hot-spot for a platform drag image at `client`.
#[must_use]
pub fn drag_preview_offset(bounds: Option<Rect>, client: Point) -> Vec2 {
    match bounds {
        Some(rect) => client - rect.origin(),
        None => client.to_vec2(),
    }
}

/// Returns `true` when `element` currently covers `point`.
#[must_use]
pub fn element_contains(element: &dyn HostElement, point: Point) -> bool {
    element
        .bounding_rect()
        .is_some_and(|rect| rect.contains(point))
}

/// A [`HostElement`] with fixed bounds.
///
/// Handy for hosts that keep their own layout results, and for tests.
#[derive(Clone, Default, PartialEq)]
pub struct FixedElement {
    bounds: Option<Rect>,
}

impl FixedElement {
    /// Creates an element with the given bounds.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds: Some(bounds),
        }
    }

    /// Creates an element without layout.
    #[must_use]
    pub fn detached() -> Self {
        Self { bounds: None }
    }
}

impl fmt::Debug for FixedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FixedElement").field(&self.bounds).finish()
    }
}

impl HostElement for FixedElement {
    fn bounding_rect(&self) -> Option<Rect> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_offset_includes_size() {
        let rect = Rect::new(10.0, 10.0, 110.0, 110.0);
        let offset = source_offset(Some(rect), Point::new(50.0, 50.0));
        assert_eq!(offset, SourceOffset::new(Vec2::new(40.0, 40.0), Size::new(100.0, 100.0)));
    }

    #[test]
    fn source_offset_without_bounds_uses_pointer() {
        let offset = source_offset(None, Point::new(50.0, 50.0));
        assert_eq!(offset.offset, Vec2::new(50.0, 50.0));
        assert_eq!(offset.size, Size::ZERO);
    }

    #[test]
    fn preview_offset_is_relative_to_bounds() {
        let rect = Rect::new(10.0, 10.0, 110.0, 110.0);
        assert_eq!(
            drag_preview_offset(Some(rect), Point::new(50.0, 50.0)),
            Vec2::new(40.0, 40.0)
        );
        assert_eq!(
            drag_preview_offset(None, Point::new(50.0, 50.0)),
            Vec2::new(50.0, 50.0)
        );
    }

    #[test]
    fn origin_for_undoes_the_offset() {
        let offset = SourceOffset::new(Vec2::new(5.0, 8.0), Size::new(20.0, 20.0));
        assert_eq!(offset.origin_for(Point::new(100.0, 100.0)), Point::new(95.0, 92.0));
    }

    #[test]
    fn detached_element_contains_nothing() {
        let el = FixedElement::detached();
        assert!(!element_contains(&el, Point::ZERO));
        let el = FixedElement::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(element_contains(&el, Point::new(5.0, 5.0)));
        assert!(!element_contains(&el, Point::new(15.0, 5.0)));
    }
}
