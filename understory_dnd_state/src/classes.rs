// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style classes that follow a flag.
//!
//! A [`ClassToggle`] holds a class list and the last applied state of a flag
//! (for example [`SourceBinding::is_dragging`](crate::source::SourceBinding::is_dragging)
//! or [`TargetBinding::is_over`](crate::target::TargetBinding::is_over)). It
//! reports a [`ClassDelta`] only when something must actually change on the
//! element.
//!
//! ## Minimal example
//!
//! ```
//! use understory_dnd_state::classes::ClassToggle;
//!
//! let mut toggle = ClassToggle::new("lifted  shadow");
//! let delta = toggle.set_active(true).unwrap();
//! assert_eq!(delta.add, ["lifted", "shadow"]);
//! assert!(toggle.set_active(true).is_none());
//!
//! let delta = toggle.set_active(false).unwrap();
//! assert_eq!(delta.remove, ["lifted", "shadow"]);
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// An ordered list of class names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassList(Vec<String>);

impl ClassList {
    /// The class names.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` when there are no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits on whitespace; empty entries are dropped.
impl From<&str> for ClassList {
    fn from(classes: &str) -> Self {
        Self(classes.split_whitespace().map(ToString::to_string).collect())
    }
}

impl From<Vec<String>> for ClassList {
    fn from(classes: Vec<String>) -> Self {
        Self(classes.into_iter().filter(|c| !c.is_empty()).collect())
    }
}

impl From<&[&str]> for ClassList {
    fn from(classes: &[&str]) -> Self {
        Self(
            classes
                .iter()
                .filter(|c| !c.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }
}

impl<const N: usize> From<[&str; N]> for ClassList {
    fn from(classes: [&str; N]) -> Self {
        Self::from(&classes[..])
    }
}

/// Classes to add to and remove from an element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDelta {
    /// Classes to add.
    pub add: Vec<String>,
    /// Classes to remove.
    pub remove: Vec<String>,
}

/// A class list applied while a flag is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassToggle {
    classes: ClassList,
    active: bool,
}

impl ClassToggle {
    /// Creates an inactive toggle.
    pub fn new(classes: impl Into<ClassList>) -> Self {
        Self {
            classes: classes.into(),
            active: false,
        }
    }

    /// The class list.
    #[must_use]
    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    /// Whether the classes are currently applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Updates the flag. Returns the change, or `None` if the flag did not
    /// change.
    pub fn set_active(&mut self, active: bool) -> Option<ClassDelta> {
        if self.active == active {
            return None;
        }
        self.active = active;
        let classes = self.classes.0.clone();
        Some(if active {
            ClassDelta {
                add: classes,
                remove: Vec::new(),
            }
        } else {
            ClassDelta {
                add: Vec::new(),
                remove: classes,
            }
        })
    }

    /// Replaces the class list.
    ///
    /// While active, the old classes are removed and the new ones added;
    /// classes in both lists are left alone.
    pub fn set_classes(&mut self, classes: impl Into<ClassList>) -> Option<ClassDelta> {
        let classes = classes.into();
        let old = core::mem::replace(&mut self.classes, classes);
        if !self.active || old == self.classes {
            return None;
        }
        let delta = ClassDelta {
            add: self
                .classes
                .0
                .iter()
                .filter(|c| !old.0.contains(c))
                .cloned()
                .collect(),
            remove: old
                .0
                .into_iter()
                .filter(|c| !self.classes.0.contains(c))
                .collect(),
        };
        (!delta.add.is_empty() || !delta.remove.is_empty()).then_some(delta)
    }
}
