// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Preview lifecycle for sources with a deferred template.
//!
//! A source whose preview is a [`PreviewTemplate`] hands the platform a
//! transparent placeholder as drag image; the real preview is drawn by a
//! [`PreviewLayer`] attached with
//! [`Dispatcher::connect_drag_layer`](crate::Dispatcher::connect_drag_layer).
//! The dispatcher drives the layer from the source's own events:
//!
//! - `DragStart`: [`show`](PreviewLayer::show) at the pointer minus the
//!   frozen source offset.
//! - `DragOver`: [`update`](PreviewLayer::update) with the new position.
//!   Movements to `(0, 0)` are synthetic and skipped. With
//!   [`PreviewUpdates::PerFrame`] only the latest movement per frame reaches
//!   the layer, on [`Dispatcher::on_animation_frame`](crate::Dispatcher::on_animation_frame).
//! - `DragEnd` / `Drop`: [`hide`](PreviewLayer::hide). Nothing reaches the
//!   layer for that source afterwards.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Point, Size};
use smallvec::SmallVec;
use tracing::trace;

use crate::event::{EventKind, SourceEvent};
use crate::id::SourceId;
use crate::offset::SourceOffset;
use crate::source::{DragSource, PreviewTemplate};

/// Where and what to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewContext<I> {
    /// Top-left corner of the preview in viewport coordinates.
    pub position: Point,
    /// Size of the dragged element at drag start.
    pub size: Size,
    /// Whether the pointer is over an accepting target.
    pub can_drop: bool,
    /// The dragged item.
    pub item: I,
}

/// The rendering collaborator for deferred previews.
pub trait PreviewLayer<I> {
    /// Starts showing a preview for `id`.
    fn show(&self, id: SourceId, template: &PreviewTemplate, context: PreviewContext<I>);

    /// Moves the preview for `id`.
    fn update(&self, id: SourceId, context: PreviewContext<I>);

    /// Stops showing the preview for `id`.
    fn hide(&self, id: SourceId);

    /// Called by [`Dispatcher::on_animation_frame`](crate::Dispatcher::on_animation_frame)
    /// after pending updates were delivered.
    fn on_animation_frame(&self) {}
}

/// How preview movements reach the layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PreviewUpdates {
    /// Coalesced; the latest movement is delivered on the next animation frame.
    #[default]
    PerFrame,
    /// Every movement is delivered as it happens.
    Immediate,
}

struct Active<I> {
    offset: SourceOffset,
    pending: Option<PreviewContext<I>>,
}

/// Per-dispatcher preview bookkeeping.
pub(crate) struct PreviewTracker<I> {
    layer: RefCell<Option<Rc<dyn PreviewLayer<I>>>>,
    active: RefCell<HashMap<SourceId, Active<I>>>,
    updates: PreviewUpdates,
}

impl<I> fmt::Debug for PreviewTracker<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewTracker")
            .field("layer", &self.layer.borrow().is_some())
            .field("active", &self.active.borrow().len())
            .field("updates", &self.updates)
            .finish()
    }
}

fn context<I: Clone>(offset: SourceOffset, event: &SourceEvent<I>) -> PreviewContext<I> {
    PreviewContext {
        position: offset.origin_for(event.client_offset),
        size: offset.size,
        can_drop: event.target.is_some(),
        item: event.item.clone(),
    }
}

impl<I: Clone + 'static> PreviewTracker<I> {
    pub(crate) fn new(updates: PreviewUpdates) -> Self {
        Self {
            layer: RefCell::new(None),
            active: RefCell::new(HashMap::new()),
            updates,
        }
    }

    pub(crate) fn set_layer(&self, layer: Option<Rc<dyn PreviewLayer<I>>>) {
        *self.layer.borrow_mut() = layer;
    }

    fn layer(&self) -> Option<Rc<dyn PreviewLayer<I>>> {
        self.layer.borrow().clone()
    }

    pub(crate) fn is_active(&self, id: SourceId) -> bool {
        self.active.borrow().contains_key(&id)
    }

    /// Reacts to one event on `source`'s private stream.
    pub(crate) fn handle(&self, source: &DragSource<I>, event: &SourceEvent<I>) {
        match event.kind {
            EventKind::DragStart => {
                let Some(template) = source.preview_template() else {
                    return;
                };
                let Some(layer) = self.layer() else {
                    return;
                };
                let offset = event.source_offset.unwrap_or_default();
                self.active.borrow_mut().insert(
                    event.id,
                    Active {
                        offset,
                        pending: None,
                    },
                );
                trace!(source = %event.id, "preview shown");
                layer.show(event.id, &template, context(offset, event));
            }
            EventKind::DragOver => {
                if event.client_offset == Point::ZERO {
                    return;
                }
                let immediate = {
                    let mut active = self.active.borrow_mut();
                    let Some(entry) = active.get_mut(&event.id) else {
                        return;
                    };
                    let ctx = context(entry.offset, event);
                    match self.updates {
                        PreviewUpdates::PerFrame => {
                            entry.pending = Some(ctx);
                            None
                        }
                        PreviewUpdates::Immediate => Some(ctx),
                    }
                };
                if let (Some(ctx), Some(layer)) = (immediate, self.layer()) {
                    layer.update(event.id, ctx);
                }
            }
            EventKind::DragEnd | EventKind::Drop => self.forget(event.id),
            EventKind::DragOut => {}
        }
    }

    /// Hides the preview for `id` if one is showing.
    pub(crate) fn forget(&self, id: SourceId) {
        let removed = self.active.borrow_mut().remove(&id);
        if removed.is_none() {
            return;
        }
        trace!(source = %id, "preview hidden");
        if let Some(layer) = self.layer() {
            layer.hide(id);
        }
    }

    /// Delivers coalesced movements. Returns how many were delivered.
    pub(crate) fn flush(&self) -> usize {
        let pending: SmallVec<[(SourceId, PreviewContext<I>); 2]> = self
            .active
            .borrow_mut()
            .iter_mut()
            .filter_map(|(id, active)| active.pending.take().map(|ctx| (*id, ctx)))
            .collect();
        let Some(layer) = self.layer() else {
            return 0;
        };
        let delivered = pending.len();
        for (id, ctx) in pending {
            layer.update(id, ctx);
        }
        layer.on_animation_frame();
        delivered
    }
}
