// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for testtree.
//!
//! `testtree ingest` reads result records as JSON lines, feeds them through a
//! result tree from several producer threads, and prints the final tree.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;
mod presenter;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, StderrStyles};
