// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection identifiers.
//!
//! A [`Dispatcher`](crate::Dispatcher) hands out one identifier per connected
//! source or target. Both roles draw from the same monotonically increasing
//! counter, so identifiers are unique across roles for the lifetime of the
//! dispatcher and are never reused.
//!
//! ```
//! use understory_dnd::{SourceId, TargetId};
//!
//! assert_eq!(SourceId::new(0).to_string(), "drag_0");
//! assert_eq!(TargetId::new(1).to_string(), "drop_1");
//! ```

use core::cell::Cell;
use core::fmt;

/// Identifier of a connected [`DragSource`](crate::DragSource).
///
/// Displays as `drag_<n>`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Creates a source identifier from a raw counter value.
    ///
    /// Identifiers are normally allocated by the dispatcher; this is mostly
    /// useful for tests that publish events by hand.
    #[must_use]
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId(drag_{})", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drag_{}", self.0)
    }
}

/// Identifier of a connected [`DropTarget`](crate::DropTarget).
///
/// Displays as `drop_<n>`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(u64);

impl TargetId {
    /// Creates a target identifier from a raw counter value.
    #[must_use]
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetId(drop_{})", self.0)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drop_{}", self.0)
    }
}

/// Kind of a drag that started outside the application.
///
/// Native drags never register a [`DragSource`](crate::DragSource). Targets opt
/// into them by listing the kind's [tag](NativeKind::tag) among their accepted
/// item types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NativeKind {
    /// The payload carries at least one file.
    File,
    /// The payload carries only text.
    String,
}

impl NativeKind {
    /// Item type tag for native file drags.
    pub const FILE_TAG: &'static str = "__FILE__";
    /// Item type tag for native text drags.
    pub const STRING_TAG: &'static str = "__STRING__";

    /// Returns the item type tag targets use to accept this kind of drag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::File => Self::FILE_TAG,
            Self::String => Self::STRING_TAG,
        }
    }

    /// Parses an item type tag back into a native kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            Self::FILE_TAG => Some(Self::File),
            Self::STRING_TAG => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What is being dragged: a registered source or a native payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragOrigin {
    /// A source connected through the dispatcher.
    Source(SourceId),
    /// A platform-level file or text drag.
    Native(NativeKind),
}

impl DragOrigin {
    /// Returns the source identifier if this is a registered source.
    #[must_use]
    pub const fn source_id(self) -> Option<SourceId> {
        match self {
            Self::Source(id) => Some(id),
            Self::Native(_) => None,
        }
    }

    /// Returns the native kind if this is a native drag.
    #[must_use]
    pub const fn native(self) -> Option<NativeKind> {
        match self {
            Self::Source(_) => None,
            Self::Native(kind) => Some(kind),
        }
    }
}

impl From<SourceId> for DragOrigin {
    fn from(id: SourceId) -> Self {
        Self::Source(id)
    }
}

impl From<NativeKind> for DragOrigin {
    fn from(kind: NativeKind) -> Self {
        Self::Native(kind)
    }
}

impl fmt::Display for DragOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(id) => fmt::Display::fmt(id, f),
            Self::Native(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

/// Monotonic identifier allocator shared by both roles.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: Cell<u64>,
}

impl IdAllocator {
    fn bump(&self) -> u64 {
        let raw = self.next.get();
        self.next.set(raw + 1);
        raw
    }

    pub(crate) fn source(&self) -> SourceId {
        SourceId(self.bump())
    }

    pub(crate) fn target(&self) -> TargetId {
        TargetId(self.bump())
    }
}
