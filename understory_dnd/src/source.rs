// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag source handles.
//!
//! A [`DragSource`] is created and owned by whatever binds an element as
//! draggable. The dispatcher only keeps a shared reference to it in the
//! registry while it is connected, so every field is interior-mutable: the
//! owner can change the item, type or predicate at any time and the next event
//! observes the change.

use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;

use crate::id::SourceId;
use crate::offset::ElementRef;

/// Whether a source may start a drag.
#[derive(Clone)]
pub enum CanDrag {
    /// A fixed answer.
    Static(bool),
    /// Asked on every drag attempt.
    Predicate(Rc<dyn Fn() -> bool>),
}

impl CanDrag {
    /// Wraps a predicate.
    pub fn predicate(f: impl Fn() -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    /// Resolves the answer.
    #[must_use]
    pub fn evaluate(&self) -> bool {
        match self {
            Self::Static(value) => *value,
            Self::Predicate(f) => f(),
        }
    }
}

impl Default for CanDrag {
    fn default() -> Self {
        Self::Static(true)
    }
}

impl From<bool> for CanDrag {
    fn from(value: bool) -> Self {
        Self::Static(value)
    }
}

impl fmt::Debug for CanDrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// An opaque, deferred preview template.
///
/// The core never looks inside; it hands the template to the
/// [`PreviewLayer`](crate::PreviewLayer), which knows how to render it.
#[derive(Clone)]
pub struct PreviewTemplate(Rc<dyn Any>);

impl PreviewTemplate {
    /// Wraps a toolkit-specific template.
    pub fn new<T: Any>(template: T) -> Self {
        Self(Rc::new(template))
    }

    /// Returns the wrapped template if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns `true` when both handles wrap the same template.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PreviewTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreviewTemplate(..)")
    }
}

/// Visual representation of a dragged source.
#[derive(Clone)]
pub enum DragPreview {
    /// A concrete element handed to the platform as the drag image.
    Element(ElementRef),
    /// A template rendered by the preview layer while dragging.
    Template(PreviewTemplate),
}

impl fmt::Debug for DragPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(_) => f.write_str("Element(..)"),
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
        }
    }
}

/// A draggable entity.
pub struct DragSource<I> {
    id: Cell<Option<SourceId>>,
    item: RefCell<I>,
    item_type: RefCell<String>,
    can_drag: RefCell<CanDrag>,
    preview: RefCell<Option<DragPreview>>,
    host: RefCell<Option<ElementRef>>,
}

impl<I> DragSource<I> {
    /// Creates a source of `item_type` carrying `item`.
    pub fn new(item_type: impl Into<String>, item: I) -> Self {
        Self {
            id: Cell::new(None),
            item: RefCell::new(item),
            item_type: RefCell::new(item_type.into()),
            can_drag: RefCell::new(CanDrag::default()),
            preview: RefCell::new(None),
            host: RefCell::new(None),
        }
    }

    /// Sets whether the source may be dragged.
    #[must_use]
    pub fn with_can_drag(self, can_drag: impl Into<CanDrag>) -> Self {
        self.set_can_drag(can_drag);
        self
    }

    /// Sets the drag preview.
    #[must_use]
    pub fn with_preview(self, preview: DragPreview) -> Self {
        self.set_preview(Some(preview));
        self
    }

    /// Sets the host element.
    #[must_use]
    pub fn with_host(self, host: ElementRef) -> Self {
        self.set_host(Some(host));
        self
    }

    /// Identifier assigned by the dispatcher, while connected.
    #[must_use]
    pub fn id(&self) -> Option<SourceId> {
        self.id.get()
    }

    pub(crate) fn set_id(&self, id: Option<SourceId>) {
        self.id.set(id);
    }

    /// Borrows the current item.
    pub fn item(&self) -> Ref<'_, I> {
        self.item.borrow()
    }

    /// Returns a copy of the current item.
    #[must_use]
    pub fn item_cloned(&self) -> I
    where
        I: Clone,
    {
        self.item.borrow().clone()
    }

    /// Replaces the item; later events carry the new value.
    pub fn set_item(&self, item: I) {
        *self.item.borrow_mut() = item;
    }

    /// Returns the item type tag.
    #[must_use]
    pub fn item_type(&self) -> String {
        self.item_type.borrow().clone()
    }

    /// Returns `true` when the item type equals `tag`.
    #[must_use]
    pub fn has_item_type(&self, tag: &str) -> bool {
        *self.item_type.borrow() == tag
    }

    /// Replaces the item type tag.
    pub fn set_item_type(&self, item_type: impl Into<String>) {
        *self.item_type.borrow_mut() = item_type.into();
    }

    /// Replaces the drag predicate.
    pub fn set_can_drag(&self, can_drag: impl Into<CanDrag>) {
        *self.can_drag.borrow_mut() = can_drag.into();
    }

    /// Evaluates whether the source may be dragged now.
    #[must_use]
    pub fn can_drag(&self) -> bool {
        // Clone out so a predicate may touch this source.
        let can_drag = self.can_drag.borrow().clone();
        can_drag.evaluate()
    }

    /// Returns the drag preview.
    #[must_use]
    pub fn preview(&self) -> Option<DragPreview> {
        self.preview.borrow().clone()
    }

    /// Returns the preview template, when the preview is deferred.
    #[must_use]
    pub fn preview_template(&self) -> Option<PreviewTemplate> {
        match &*self.preview.borrow() {
            Some(DragPreview::Template(template)) => Some(template.clone()),
            _ => None,
        }
    }

    /// Replaces the drag preview.
    pub fn set_preview(&self, preview: Option<DragPreview>) {
        *self.preview.borrow_mut() = preview;
    }

    /// Returns the host element.
    #[must_use]
    pub fn host(&self) -> Option<ElementRef> {
        self.host.borrow().clone()
    }

    /// Replaces the host element.
    pub fn set_host(&self, host: Option<ElementRef>) {
        *self.host.borrow_mut() = host;
    }
}

impl<I: fmt::Debug> fmt::Debug for DragSource<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragSource")
            .field("id", &self.id.get())
            .field("item", &self.item.borrow())
            .field("item_type", &self.item_type.borrow())
            .field("can_drag", &self.can_drag.borrow())
            .field("preview", &self.preview.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_draggable_without_preview() {
        let source = DragSource::new("card", 1_u32);
        assert!(source.can_drag());
        assert!(source.preview().is_none());
        assert!(source.id().is_none());
        assert_eq!(source.item_type(), "card");
    }

    #[test]
    fn predicate_is_evaluated_each_time() {
        let allowed = Rc::new(Cell::new(false));
        let flag = allowed.clone();
        let source = DragSource::new("card", ()).with_can_drag(CanDrag::predicate(move || flag.get()));
        assert!(!source.can_drag());
        allowed.set(true);
        assert!(source.can_drag());
    }

    #[test]
    fn item_can_change_after_creation() {
        let source = DragSource::new("card", 1_u32);
        source.set_item(2);
        assert_eq!(source.item_cloned(), 2);
        assert_eq!(*source.item(), 2);
    }

    #[test]
    fn template_preview_is_exposed() {
        let source = DragSource::new("card", ()).with_preview(DragPreview::Template(PreviewTemplate::new("tpl")));
        let template = source.preview_template();
        assert_eq!(template.as_ref().and_then(|t| t.downcast_ref::<&str>()), Some(&"tpl"));
    }
}
