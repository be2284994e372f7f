// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform drag transport, as seen by a backend.
//!
//! A host toolkit adapts its native drag notifications to [`PlatformDragEvent`]
//! and feeds them to a backend. The trait covers exactly what the backend
//! needs: the pointer position, a timestamp for debouncing, the payload
//! carrier (queued items and files), and the three side channels back to the
//! platform (drag image, drop effect hint, cancellation).

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Vec2};

use crate::error::DragImageError;
use crate::id::NativeKind;
use crate::monitor::PreviewImage;
use crate::target::DropEffect;

/// Kind of an entry in the platform's queued item list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransferItemKind {
    /// A file entry.
    File,
    /// A string entry (text, URL, markup, ...).
    String,
}

/// One queued entry of a drag payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferItem {
    /// Whether the entry is a file or a string.
    pub kind: TransferItemKind,
    /// MIME type of the entry, for example `text/plain`.
    pub mime: String,
}

impl TransferItem {
    /// Creates a file entry.
    #[must_use]
    pub fn file(mime: impl Into<String>) -> Self {
        Self {
            kind: TransferItemKind::File,
            mime: mime.into(),
        }
    }

    /// Creates a string entry.
    #[must_use]
    pub fn string(mime: impl Into<String>) -> Self {
        Self {
            kind: TransferItemKind::String,
            mime: mime.into(),
        }
    }

    /// Returns `true` for `text/plain` string entries, the ones a native
    /// text drop extracts.
    #[must_use]
    pub fn is_plain_text(&self) -> bool {
        self.kind == TransferItemKind::String && self.mime == "text/plain"
    }
}

/// A file carried by a native drag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeFile {
    /// File name as reported by the platform.
    pub name: String,
    /// MIME type, possibly empty.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
    /// Filesystem path, when the platform exposes one.
    pub path: Option<String>,
}

impl NativeFile {
    /// Creates a file record with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Classifies a native payload.
///
/// Any file in the file list, or any queued item of kind file, makes it a
/// [`NativeKind::File`] drag; everything else is [`NativeKind::String`].
#[must_use]
pub fn classify(items: &[TransferItem], files: &[NativeFile]) -> NativeKind {
    if !files.is_empty() || items.iter().any(|item| item.kind == TransferItemKind::File) {
        NativeKind::File
    } else {
        NativeKind::String
    }
}

/// Callback receiving the contents of one string entry.
pub type StringCallback = Box<dyn FnOnce(String)>;

/// One platform drag notification together with its payload carrier.
pub trait PlatformDragEvent {
    /// Pointer position in viewport coordinates.
    fn client_offset(&self) -> Point;

    /// Monotonic timestamp in milliseconds.
    fn timestamp(&self) -> u64;

    /// Queued payload entries.
    fn items(&self) -> &[TransferItem];

    /// Flat file list of the payload.
    fn files(&self) -> &[NativeFile];

    /// Reads out the dropped files and clears them from the payload.
    fn take_files(&mut self) -> Vec<NativeFile>;

    /// Reads the string entry at `index` of [`items`](Self::items).
    ///
    /// Platforms resolve this asynchronously; `done` may run after this call
    /// returns.
    fn read_string(&mut self, index: usize, done: StringCallback);

    /// Sets a custom drag image with its hot-spot.
    fn set_drag_image(&mut self, image: &PreviewImage, hotspot: Vec2) -> Result<(), DragImageError>;

    /// Sets the drop effect hint shown by the platform cursor.
    fn set_drop_effect(&mut self, effect: DropEffect);

    /// Cancels the platform's default handling (cancels a drag start, allows
    /// a drop).
    fn prevent_default(&mut self);
}
