// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;

/// Errors building a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatcherError {
    /// No backend factory was supplied; the dispatcher has no transport.
    #[error("no drag backend provided")]
    MissingBackend,
}

/// Failure to set a custom drag image on the platform.
///
/// Backends log and ignore these; the gesture continues with the platform's
/// default image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragImageError {
    /// The transport cannot show custom drag images.
    #[error("custom drag images are not supported by this transport")]
    Unsupported,
    /// The transport refused the image.
    #[error("drag image rejected: {0}")]
    Rejected(String),
}
