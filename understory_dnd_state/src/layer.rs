// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless drag layer.
//!
//! [`DragLayer`] implements [`PreviewLayer`] by keeping one [`Preview`] per
//! dragged source. A renderer reads [`DragLayer::previews`] each frame and
//! draws each template at its context's position.
//!
//! A new preview starts hidden and becomes visible on the next animation
//! frame, so the renderer can lay it out once before it fades in.
//!
//! ## Minimal example
//!
//! ```
//! use std::rc::Rc;
//! use kurbo::{Point, Size};
//! use understory_dnd::{PreviewContext, PreviewLayer, PreviewTemplate, SourceId};
//! use understory_dnd_state::layer::DragLayer;
//!
//! let layer = Rc::new(DragLayer::<u32>::new());
//! let context = PreviewContext { position: Point::new(5.0, 5.0), size: Size::new(20.0, 10.0), can_drop: false, item: 1 };
//! layer.show(SourceId::new(0), &PreviewTemplate::new("card"), context);
//! assert!(!layer.previews()[0].visible);
//!
//! layer.on_animation_frame();
//! assert!(layer.previews()[0].visible);
//! ```

use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use tracing::trace;
use understory_dnd::{PreviewContext, PreviewLayer, PreviewTemplate, SourceId};

/// One floating preview.
#[derive(Clone, Debug)]
pub struct Preview<I> {
    /// The dragged source.
    pub id: SourceId,
    /// What to draw.
    pub template: PreviewTemplate,
    /// Where to draw it.
    pub context: PreviewContext<I>,
    /// `false` until the first animation frame after it was shown.
    pub visible: bool,
}

/// A [`PreviewLayer`] that stores previews for a renderer to draw.
pub struct DragLayer<I> {
    previews: RefCell<HashMap<SourceId, Preview<I>>>,
}

impl<I> Default for DragLayer<I> {
    fn default() -> Self {
        Self {
            previews: RefCell::new(HashMap::new()),
        }
    }
}

impl<I: fmt::Debug> fmt::Debug for DragLayer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragLayer")
            .field("previews", &self.previews.borrow())
            .finish()
    }
}

impl<I: Clone> DragLayer<I> {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current previews, ordered by source.
    #[must_use]
    pub fn previews(&self) -> Vec<Preview<I>> {
        let mut previews: Vec<_> = self.previews.borrow().values().cloned().collect();
        previews.sort_by_key(|p| p.id);
        previews
    }

    /// The preview for `id`, if one is showing.
    #[must_use]
    pub fn preview(&self, id: SourceId) -> Option<Preview<I>> {
        self.previews.borrow().get(&id).cloned()
    }

    /// Number of previews.
    #[must_use]
    pub fn len(&self) -> usize {
        self.previews.borrow().len()
    }

    /// Returns `true` when no preview is showing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.previews.borrow().is_empty()
    }
}

impl<I> PreviewLayer<I> for DragLayer<I> {
    fn show(&self, id: SourceId, template: &PreviewTemplate, context: PreviewContext<I>) {
        trace!(source = %id, "preview added");
        self.previews.borrow_mut().insert(
            id,
            Preview {
                id,
                template: template.clone(),
                context,
                visible: false,
            },
        );
    }

    fn update(&self, id: SourceId, context: PreviewContext<I>) {
        if let Some(preview) = self.previews.borrow_mut().get_mut(&id) {
            preview.context = context;
        }
    }

    fn hide(&self, id: SourceId) {
        if self.previews.borrow_mut().remove(&id).is_some() {
            trace!(source = %id, "preview removed");
        }
    }

    fn on_animation_frame(&self) {
        for preview in self.previews.borrow_mut().values_mut() {
            preview.visible = true;
        }
    }
}
