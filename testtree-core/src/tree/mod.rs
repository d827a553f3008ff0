// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The result aggregation tree.
//!
//! The tree has three levels: an implicit root, one [`SeriesNode`] per series
//! in the order series were first seen, and within each series a list of
//! [`ResultNode`]s kept sorted by [`UpsertKey`].
//!
//! Nodes are stored in contiguous vectors and addressed by position. There are
//! no parent pointers: a node's parent is implied by which vector holds it.

mod children;
mod imp;
mod key;
mod series;
mod snapshot;
mod summary;

pub use children::*;
pub use imp::*;
pub use key::*;
pub use series::*;
pub use snapshot::*;
pub use summary::*;
