// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifier → handle bookkeeping.
//!
//! [`Registry`] is plain storage: no validation and no side effects. Lookups of
//! identifiers that were never stored, or were already deleted, return `None`.

use alloc::rc::Rc;
use core::fmt;

use hashbrown::HashMap;

use crate::id::{SourceId, TargetId};
use crate::source::DragSource;
use crate::target::DropTarget;

/// Maps identifiers to the live source and target handles.
pub struct Registry<I> {
    sources: HashMap<SourceId, Rc<DragSource<I>>>,
    targets: HashMap<TargetId, Rc<DropTarget<I>>>,
}

impl<I> Default for Registry<I> {
    fn default() -> Self {
        Self {
            sources: HashMap::new(),
            targets: HashMap::new(),
        }
    }
}

impl<I> Registry<I> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `source` under `id`, replacing any previous entry.
    pub fn set_source(&mut self, id: SourceId, source: Rc<DragSource<I>>) {
        self.sources.insert(id, source);
    }

    /// Looks up a source.
    #[must_use]
    pub fn get_source(&self, id: SourceId) -> Option<Rc<DragSource<I>>> {
        self.sources.get(&id).cloned()
    }

    /// Removes a source; a no-op when absent.
    pub fn delete_source(&mut self, id: SourceId) {
        self.sources.remove(&id);
    }

    /// Stores `target` under `id`, replacing any previous entry.
    pub fn set_target(&mut self, id: TargetId, target: Rc<DropTarget<I>>) {
        self.targets.insert(id, target);
    }

    /// Looks up a target.
    #[must_use]
    pub fn get_target(&self, id: TargetId) -> Option<Rc<DropTarget<I>>> {
        self.targets.get(&id).cloned()
    }

    /// Removes a target; a no-op when absent.
    pub fn delete_target(&mut self, id: TargetId) {
        self.targets.remove(&id);
    }

    /// Number of registered sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of registered targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

impl<I> fmt::Debug for Registry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("sources", &self.sources.len())
            .field("targets", &self.targets.len())
            .finish()
    }
}
