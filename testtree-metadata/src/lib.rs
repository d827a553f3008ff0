// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the result records consumed by testtree.
//!
//! A test execution engine produces one [`ResultRecord`] per completed check
//! and hands it to testtree. This crate defines that record along with its
//! JSON encoding, so engines written independently of testtree can emit
//! records without depending on the aggregation machinery.

mod errors;
mod exit_codes;
mod record;

pub use errors::*;
pub use exit_codes::*;
pub use record::*;
