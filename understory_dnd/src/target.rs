// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drop target handles.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::id::{NativeKind, TargetId};
use crate::offset::ElementRef;

/// Semantic of an accepted drop, surfaced to the platform cursor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DropEffect {
    /// The item is copied.
    #[default]
    Copy,
    /// The item is moved.
    Move,
    /// A link to the item is created.
    Link,
    /// Dropping is not possible.
    None,
}

impl DropEffect {
    /// Returns the conventional lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Link => "link",
            Self::None => "none",
        }
    }
}

/// One or more item type tags.
///
/// A single tag matches by equality, several by membership; both are stored
/// the same way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemTypes(Vec<String>);

impl ItemTypes {
    /// Returns `true` when `tag` is one of the types.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Returns the tags.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` when there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ItemTypes {
    fn from(tag: &str) -> Self {
        Self(alloc::vec![tag.to_string()])
    }
}

impl From<String> for ItemTypes {
    fn from(tag: String) -> Self {
        Self(alloc::vec![tag])
    }
}

impl From<Vec<String>> for ItemTypes {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

impl From<&[&str]> for ItemTypes {
    fn from(tags: &[&str]) -> Self {
        Self(tags.iter().map(|t| t.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ItemTypes {
    fn from(tags: [&str; N]) -> Self {
        Self(tags.iter().map(|t| t.to_string()).collect())
    }
}

/// The dragged thing, as shown to a drop predicate.
#[derive(Debug)]
pub enum Incoming<'a, I> {
    /// A registered source's item.
    Item(&'a I),
    /// A native drag; there is no item yet.
    Native(NativeKind),
}

impl<I> Clone for Incoming<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Incoming<'_, I> {}

/// Whether a target accepts a compatible item.
pub enum CanDrop<I> {
    /// A fixed answer.
    Static(bool),
    /// Asked on every hover and drop.
    Predicate(Rc<dyn Fn(Incoming<'_, I>) -> bool>),
}

impl<I> CanDrop<I> {
    /// Wraps a predicate.
    pub fn predicate(f: impl Fn(Incoming<'_, I>) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    /// Resolves the answer for `incoming`.
    #[must_use]
    pub fn evaluate(&self, incoming: Incoming<'_, I>) -> bool {
        match self {
            Self::Static(value) => *value,
            Self::Predicate(f) => f(incoming),
        }
    }
}

impl<I> Clone for CanDrop<I> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(value) => Self::Static(*value),
            Self::Predicate(f) => Self::Predicate(f.clone()),
        }
    }
}

impl<I> Default for CanDrop<I> {
    fn default() -> Self {
        Self::Static(true)
    }
}

impl<I> From<bool> for CanDrop<I> {
    fn from(value: bool) -> Self {
        Self::Static(value)
    }
}

impl<I> fmt::Debug for CanDrop<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A droppable entity.
pub struct DropTarget<I> {
    id: Cell<Option<TargetId>>,
    item_types: RefCell<ItemTypes>,
    can_drop: RefCell<CanDrop<I>>,
    drop_effect: Cell<DropEffect>,
    host: RefCell<Option<ElementRef>>,
}

impl<I> DropTarget<I> {
    /// Creates a target accepting `item_types`.
    pub fn new(item_types: impl Into<ItemTypes>) -> Self {
        Self {
            id: Cell::new(None),
            item_types: RefCell::new(item_types.into()),
            can_drop: RefCell::new(CanDrop::default()),
            drop_effect: Cell::new(DropEffect::default()),
            host: RefCell::new(None),
        }
    }

    /// Sets whether compatible items may be dropped.
    #[must_use]
    pub fn with_can_drop(self, can_drop: impl Into<CanDrop<I>>) -> Self {
        self.set_can_drop(can_drop);
        self
    }

    /// Sets the drop effect hint.
    #[must_use]
    pub fn with_drop_effect(self, effect: DropEffect) -> Self {
        self.drop_effect.set(effect);
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
    pub fn id(&self) -> Option<TargetId> {
        self.id.get()
    }

    pub(crate) fn set_id(&self, id: Option<TargetId>) {
        self.id.set(id);
    }

    /// Returns the accepted item types.
    #[must_use]
    pub fn item_types(&self) -> ItemTypes {
        self.item_types.borrow().clone()
    }

    /// Returns `true` when `tag` is accepted.
    #[must_use]
    pub fn accepts(&self, tag: &str) -> bool {
        self.item_types.borrow().contains(tag)
    }

    /// Replaces the accepted item types.
    pub fn set_item_types(&self, item_types: impl Into<ItemTypes>) {
        *self.item_types.borrow_mut() = item_types.into();
    }

    /// Replaces the drop predicate.
    pub fn set_can_drop(&self, can_drop: impl Into<CanDrop<I>>) {
        *self.can_drop.borrow_mut() = can_drop.into();
    }

    /// Evaluates the drop predicate for `incoming`.
    ///
    /// This does not check item types; see
    /// [`Monitor::can_drop`](crate::Monitor::can_drop) for the full decision.
    #[must_use]
    pub fn evaluate_can_drop(&self, incoming: Incoming<'_, I>) -> bool {
        // Clone out so a predicate may touch this target.
        let can_drop = self.can_drop.borrow().clone();
        can_drop.evaluate(incoming)
    }

    /// Returns the drop effect hint.
    #[must_use]
    pub fn drop_effect(&self) -> DropEffect {
        self.drop_effect.get()
    }

    /// Replaces the drop effect hint.
    pub fn set_drop_effect(&self, effect: DropEffect) {
        self.drop_effect.set(effect);
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

impl<I> fmt::Debug for DropTarget<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropTarget")
            .field("id", &self.id.get())
            .field("item_types", &self.item_types.borrow())
            .field("can_drop", &self.can_drop.borrow())
            .field("drop_effect", &self.drop_effect.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_types_from_one_or_many() {
        let one = ItemTypes::from("card");
        assert!(one.contains("card"));
        assert!(!one.contains("list"));

        let many = ItemTypes::from(["card", "list"]);
        assert!(many.contains("card"));
        assert!(many.contains("list"));
        assert!(!many.contains("item"));
    }

    #[test]
    fn defaults() {
        let target = DropTarget::<()>::new("card");
        assert_eq!(target.drop_effect(), DropEffect::Copy);
        assert!(target.evaluate_can_drop(Incoming::Native(NativeKind::File)));
        assert!(target.id().is_none());
    }

    #[test]
    fn predicate_sees_the_incoming_item() {
        let target = DropTarget::new("n").with_can_drop(CanDrop::predicate(|incoming: Incoming<'_, u32>| {
            matches!(incoming, Incoming::Item(n) if *n > 10)
        }));
        assert!(target.evaluate_can_drop(Incoming::Item(&11)));
        assert!(!target.evaluate_can_drop(Incoming::Item(&3)));
        assert!(!target.evaluate_can_drop(Incoming::Native(NativeKind::String)));
    }

    #[test]
    fn drop_effect_names() {
        assert_eq!(DropEffect::Move.as_str(), "move");
        assert_eq!(DropEffect::None.as_str(), "none");
    }
}
