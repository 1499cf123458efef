// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported when building spatial structures.

use alloc::string::String;

/// Errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A tree was asked to split down to leaves of zero points.
    #[error("minimum leaf size must be at least 1")]
    InvalidMinSize,
    /// Coordinate arrays do not describe a whole number of points.
    #[error("coordinate arrays disagree in length: {0}")]
    LengthMismatch(String),
}

/// Shorthand for results carrying [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
