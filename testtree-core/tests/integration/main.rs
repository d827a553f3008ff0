// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: producers on many threads, a mutator thread, and config
//! loaded from disk.

mod config_files;
mod fixtures;
mod producers;
