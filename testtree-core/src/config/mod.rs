// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for testtree.
//!
//! Settings are read from `.config/testtree.toml` (or an explicitly provided
//! file), layered on top of an embedded default config.

mod imp;

pub use imp::*;
