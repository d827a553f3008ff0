// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testtree.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::thread::ThreadId;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse testtree config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// A value was syntactically valid but out of range.
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue {
        /// The dotted path to the offending key.
        key: &'static str,

        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// A [`ResultTree`](crate::tree::ResultTree) was accessed from a thread other
/// than the mutator thread it is confined to.
///
/// This is always a programming error. The tree relies on a single writer for
/// correctness, so operations that detect this panic with this error's
/// message rather than continuing.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error(
    "`{operation}` called on thread {accessed_from:?}, \
     but the result tree is confined to thread {owner:?}"
)]
pub struct ConfinementViolation {
    operation: &'static str,
    owner: ThreadId,
    accessed_from: ThreadId,
}

impl ConfinementViolation {
    pub(crate) fn new(operation: &'static str, owner: ThreadId, accessed_from: ThreadId) -> Self {
        Self {
            operation,
            owner,
            accessed_from,
        }
    }

    /// The operation that was attempted.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The mutator thread the tree is confined to.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// The thread the access was attempted from.
    pub fn accessed_from(&self) -> ThreadId {
        self.accessed_from
    }
}

/// An error that occurred while spawning a
/// [`MutatorThread`](crate::dispatcher::MutatorThread).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MutatorSpawnError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime for the mutator thread")]
    TokioRuntimeCreate(#[source] std::io::Error),

    /// An error occurred while spawning the thread.
    #[error("error spawning the mutator thread")]
    ThreadSpawn(#[source] std::io::Error),
}
