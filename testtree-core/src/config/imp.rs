// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind},
    tree::UpsertKeyMode,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::BTreeSet, num::NonZeroUsize};
use tracing::{debug, warn};

/// Trait for handling configuration warnings.
///
/// This trait allows for different warning handling strategies, such as
/// logging warnings (the default behavior) or collecting them for testing
/// purposes.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the
/// tracing crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push_str("\n  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// Overall configuration for testtree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestTreeConfig {
    tree: TreeConfig,
    dispatcher: DispatcherConfig,
}

/// Settings for the [`ResultTree`](crate::tree::ResultTree).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeConfig {
    /// How incoming records are matched to existing entries.
    pub upsert_key: UpsertKeyMode,

    /// Whether to signal when the first series of a run is created.
    pub reveal_first_series: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            upsert_key: UpsertKeyMode::DisplayName,
            reveal_first_series: true,
        }
    }
}

/// Settings for the [`ConfinementDispatcher`](crate::dispatcher::ConfinementDispatcher).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DispatcherConfig {
    /// The number of records applied before yielding to the hosting runtime.
    pub yield_every: NonZeroUsize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            yield_every: NonZeroUsize::MIN,
        }
    }
}

impl TestTreeConfig {
    /// The default location of the config within the path.
    pub const CONFIG_PATH: &'static str = ".config/testtree.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default
    /// config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the testtree config from the given file, or if not specified from
    /// `.config/testtree.toml` in the given directory.
    ///
    /// If the file isn't specified and the directory doesn't have
    /// `.config/testtree.toml`, uses the default config options.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        debug!(%config_file, "loading testtree config");
        let builder = Self::make_default_config().add_source(source);
        Self::build(&config_file, &builder, warnings)
    }

    /// Parses a config from a TOML string, layered on top of the default
    /// config.
    ///
    /// `config_file` is only used for error and warning messages.
    pub fn from_toml_str(
        config_file: &Utf8Path,
        contents: &str,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let builder =
            Self::make_default_config().add_source(File::from_str(contents, FileFormat::Toml));
        Self::build(config_file, &builder, warnings)
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        let builder = Self::make_default_config();
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .expect("embedded default config should be valid");

        // Make sure there aren't any unknown keys in the default config, since
        // it is embedded/shipped with this binary.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        config
            .into_config()
            .expect("embedded default config should have valid values")
    }

    /// Returns the tree settings.
    pub fn tree(&self) -> &TreeConfig {
        &self.tree
    }

    /// Returns the dispatcher settings.
    pub fn dispatcher(&self) -> &DispatcherConfig {
        &self.dispatcher
    }

    // ---
    // Helper methods
    // ---

    fn build(
        config_file: &Utf8Path,
        builder: &ConfigBuilder<DefaultState>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config, unknown) = Self::build_and_deserialize_config(builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(config_file, &unknown);
        }

        config
            .into_config()
            .map_err(|kind| ConfigParseError::new(config_file, kind))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(TestTreeConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: TestTreeConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // Both serde_path_to_error and the config crate report the
                // key. Drop the key from the config error for consistency.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TestTreeConfigDeserialize {
    tree: TreeConfigDeserialize,
    dispatcher: DispatcherConfigDeserialize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TreeConfigDeserialize {
    upsert_key: UpsertKeyMode,
    reveal_first_series: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DispatcherConfigDeserialize {
    yield_every: usize,
}

impl TestTreeConfigDeserialize {
    fn into_config(self) -> Result<TestTreeConfig, ConfigParseErrorKind> {
        let yield_every = NonZeroUsize::new(self.dispatcher.yield_every).ok_or(
            ConfigParseErrorKind::InvalidValue {
                key: "dispatcher.yield-every",
                reason: "must be at least 1",
            },
        )?;

        Ok(TestTreeConfig {
            tree: TreeConfig {
                upsert_key: self.tree.upsert_key,
                reveal_first_series: self.tree.reveal_first_series,
            },
            dispatcher: DispatcherConfig { yield_every },
        })
    }
}
