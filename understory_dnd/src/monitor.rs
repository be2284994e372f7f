// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry queries used by backends.
//!
//! [`Monitor`] answers "can this source drag", "can this target take what is
//! being dragged", "what should the platform show as drag image" and "which
//! drop effect should the cursor show", from identifiers alone. It is a pure
//! function of the registry contents: unknown identifiers get a negative
//! answer, never an error, because identifiers may go stale between an
//! event's emission and its handling.
//!
//! Predicates are evaluated on every call; nothing is cached.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::Rect;

use crate::id::{DragOrigin, SourceId, TargetId};
use crate::offset::ElementRef;
use crate::registry::Registry;
use crate::source::DragPreview;
use crate::target::{DropEffect, Incoming};

/// A 1×1 transparent GIF.
///
/// Platforms need a real image to suppress their default drag image; this is
/// what [`PreviewImage::Placeholder`] stands for.
pub const TRANSPARENT_PIXEL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04,
    0x01, 0x0a, 0x00, 0x01, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
    0x02, 0x4c, 0x01, 0x00, 0x3b,
];

/// What to hand to the platform as the drag image.
#[derive(Clone)]
pub enum PreviewImage {
    /// The transparent placeholder; the preview layer draws the real preview.
    Placeholder,
    /// An element rendered by the platform.
    Element(ElementRef),
}

impl PreviewImage {
    /// Bounds of the image, used to compute its hot-spot.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Self::Placeholder => None,
            Self::Element(element) => element.bounding_rect(),
        }
    }

    /// Returns `true` for the placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Debug for PreviewImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => f.write_str("Placeholder"),
            Self::Element(element) => f
                .debug_tuple("Element")
                .field(&element.bounding_rect())
                .finish(),
        }
    }
}

/// Read-only queries over a shared [`Registry`].
pub struct Monitor<I> {
    registry: Rc<RefCell<Registry<I>>>,
}

impl<I> Clone for Monitor<I> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<I> fmt::Debug for Monitor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("registry", &self.registry.borrow())
            .finish()
    }
}

impl<I> Monitor<I> {
    /// Creates a monitor over `registry`.
    #[must_use]
    pub fn new(registry: Rc<RefCell<Registry<I>>>) -> Self {
        Self { registry }
    }

    /// Returns the registry this monitor reads.
    #[must_use]
    pub fn registry(&self) -> &Rc<RefCell<Registry<I>>> {
        &self.registry
    }

    /// Whether the source may start a drag. Unknown sources cannot.
    #[must_use]
    pub fn can_drag(&self, source_id: SourceId) -> bool {
        let source = self.registry.borrow().get_source(source_id);
        source.is_some_and(|source| source.can_drag())
    }

    /// Whether the target accepts what is being dragged.
    ///
    /// - Unknown targets, a missing origin, and unknown sources are rejected.
    /// - Native drags match when the target lists the native tag; the
    ///   predicate then receives [`Incoming::Native`].
    /// - Registered sources match when the target lists the source's item
    ///   type; the predicate then receives the source's item.
    #[must_use]
    pub fn can_drop(&self, target_id: TargetId, origin: Option<DragOrigin>) -> bool
    where
        I: Clone,
    {
        let target = self.registry.borrow().get_target(target_id);
        let Some(target) = target else {
            return false;
        };
        match origin {
            None => false,
            Some(DragOrigin::Native(kind)) => {
                target.accepts(kind.tag()) && target.evaluate_can_drop(Incoming::Native(kind))
            }
            Some(DragOrigin::Source(source_id)) => {
                let source = self.registry.borrow().get_source(source_id);
                let Some(source) = source else {
                    return false;
                };
                if !target.accepts(&source.item_type()) {
                    return false;
                }
                // A copy, so the predicate may replace the item.
                let item = source.item_cloned();
                target.evaluate_can_drop(Incoming::Item(&item))
            }
        }
    }

    /// The drag image for a source.
    ///
    /// Deferred templates get the [placeholder](PreviewImage::Placeholder),
    /// element previews are used as is, and sources without a preview drag
    /// their own host element.
    #[must_use]
    pub fn preview_image_for_source(&self, source_id: SourceId) -> Option<PreviewImage> {
        let source = self.registry.borrow().get_source(source_id)?;
        match source.preview() {
            Some(DragPreview::Template(_)) => Some(PreviewImage::Placeholder),
            Some(DragPreview::Element(element)) => Some(PreviewImage::Element(element)),
            None => source.host().map(PreviewImage::Element),
        }
    }

    /// The drop effect hint for a target; [`DropEffect::None`] when unknown.
    #[must_use]
    pub fn drop_effect_for_target(&self, target_id: TargetId) -> DropEffect {
        self.registry
            .borrow()
            .get_target(target_id)
            .map_or(DropEffect::None, |target| target.drop_effect())
    }
}
