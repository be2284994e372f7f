// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`DragBackend`](crate::DragBackend) implementations.

#[cfg(feature = "native")]
mod native;
mod test;

#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use test::TestBackend;
