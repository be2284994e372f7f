// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conditional content for drop zones.
//!
//! [`IfOver`] shows content while a target is hovered. [`IfDragging`] shows
//! content while a compatible drag is in progress, optionally hiding it again
//! while the target itself is hovered. Both report a [`ViewChange`] only when
//! the content must appear or disappear.
//!
//! ```
//! use understory_dnd_state::visibility::{IfDragging, ViewChange};
//!
//! let mut hint = IfDragging::new(true);
//! assert_eq!(hint.set_dragging(true), Some(ViewChange::Show));
//! assert_eq!(hint.set_over(true), Some(ViewChange::Hide));
//! assert_eq!(hint.set_over(false), Some(ViewChange::Show));
//! assert_eq!(hint.set_dragging(false), Some(ViewChange::Hide));
//! ```

/// A transition of conditional content.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewChange {
    /// Create the content.
    Show,
    /// Remove the content.
    Hide,
}

fn transition(shown: &mut bool, wanted: bool) -> Option<ViewChange> {
    if *shown == wanted {
        return None;
    }
    *shown = wanted;
    Some(if wanted {
        ViewChange::Show
    } else {
        ViewChange::Hide
    })
}

/// Content shown while the target is hovered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IfOver {
    shown: bool,
}

impl IfOver {
    /// Creates a hidden instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the content is shown.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Feeds one hover signal; `true` for a hover, `false` for a leave.
    pub fn set_over(&mut self, over: bool) -> Option<ViewChange> {
        transition(&mut self.shown, over)
    }
}

/// Content shown while a compatible drag is in progress.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IfDragging {
    hide_when_over: bool,
    /// `None` until the first dragging signal.
    dragging: Option<bool>,
    over: bool,
    shown: bool,
}

impl IfDragging {
    /// Creates a hidden instance.
    pub fn new(hide_when_over: bool) -> Self {
        Self {
            hide_when_over,
            ..Self::default()
        }
    }

    /// Whether the content is shown.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Whether hovering the target hides the content.
    #[must_use]
    pub fn hide_when_over(&self) -> bool {
        self.hide_when_over
    }

    /// Changes whether hovering the target hides the content.
    pub fn set_hide_when_over(&mut self, hide_when_over: bool) -> Option<ViewChange> {
        self.hide_when_over = hide_when_over;
        self.reconcile()
    }

    /// Feeds one dragging signal.
    pub fn set_dragging(&mut self, dragging: bool) -> Option<ViewChange> {
        self.dragging = Some(dragging);
        self.reconcile()
    }

    /// Feeds one hover signal.
    ///
    /// Nothing is decided before the first dragging signal.
    pub fn set_over(&mut self, over: bool) -> Option<ViewChange> {
        self.over = over;
        self.reconcile()
    }

    fn reconcile(&mut self) -> Option<ViewChange> {
        let dragging = self.dragging?;
        let wanted = dragging && !(self.hide_when_over && self.over);
        transition(&mut self.shown, wanted)
    }
}
