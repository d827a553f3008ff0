// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for testtree: an incrementally updated, sorted tree of
//! test results.
//!
//! Results arrive from any number of producer threads through a
//! [`ResultSender`](dispatcher::ResultSender). They are queued and applied, in
//! the order they were enqueued, to a [`ResultTree`](tree::ResultTree) owned by
//! a single mutator thread. Observers on that thread receive a
//! [`TreeEvent`](events::TreeEvent) for every structural change.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod selection;
pub mod tree;
