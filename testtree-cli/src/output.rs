// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal settings: when to use color, and where log events go.
//!
//! Log events from every crate are written to stderr with a short level
//! heading. `--verbose` raises testtree's own crates to `debug`, so series
//! creation, insert versus replace and the mutator loop become visible.
//! `TESTTREE_LOG` takes a full `Targets` directive list instead and wins over
//! `--verbose` when set.

use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Style, style};
use std::{fmt, sync::Once};
use swrite::{SWrite, swrite};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
    warn,
};
use tracing_subscriber::{
    Layer,
    filter::{ParseError, Targets},
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log events with this target are printed without a level heading.
pub(crate) const NO_HEADING_TARGET: &str = "testtree::no_heading";

const LOG_ENV: &str = "TESTTREE_LOG";

/// Crates raised to `debug` by `--verbose`.
const VERBOSE_TARGETS: [&str; 3] = ["testtree_cli", "testtree_core", "testtree_metadata"];

#[derive(Copy, Clone, Debug, Args)]
pub(crate) struct OutputOpts {
    /// Expand every series, show result messages, and log debug events
    #[arg(long, short, global = true, env = "TESTTREE_VERBOSE")]
    verbose: bool,

    /// When to use color: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "TESTTREE_COLOR"
    )]
    color: Color,
}

impl OutputOpts {
    /// Installs the global log subscriber and returns the chosen settings.
    pub(crate) fn init(self) -> OutputContext {
        let output = OutputContext {
            verbose: self.verbose,
            color: self.color,
        };
        output.install_logger();
        output
    }
}

/// Output settings chosen on the command line.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub(crate) verbose: bool,
    pub(crate) color: Color,
}

impl OutputContext {
    /// Returns styles for error messages written to stderr.
    pub fn stderr_styles(&self) -> StderrStyles {
        if self.color.should_colorize(supports_color::Stream::Stderr) {
            StderrStyles::colorized()
        } else {
            StderrStyles::default()
        }
    }

    pub(crate) fn colorize_stdout(&self) -> bool {
        self.color.should_colorize(supports_color::Stream::Stdout)
    }

    fn install_logger(&self) {
        static INSTALLED: Once = Once::new();

        let styles = if self.color.should_colorize(supports_color::Stream::Stderr) {
            LogStyles::colorized()
        } else {
            LogStyles::default()
        };
        let verbose = self.verbose;

        INSTALLED.call_once(|| {
            let env = std::env::var_os(LOG_ENV);
            let env = env.as_ref().map(|value| value.to_string_lossy());
            let (targets, invalid) = match log_targets(env.as_deref(), verbose) {
                Ok(targets) => (targets, None),
                Err(err) => (default_targets(verbose), Some(err)),
            };

            let layer = tracing_subscriber::fmt::layer()
                .event_format(LogFormatter {
                    styles,
                    show_targets: verbose,
                })
                .with_writer(std::io::stderr)
                .with_filter(targets);
            tracing_subscriber::registry().with(layer).init();

            if let Some(err) = invalid {
                warn!("ignoring {LOG_ENV}, which is not a valid filter: {err}");
            }
        });
    }
}

/// Builds the log filter from the value of `TESTTREE_LOG` (if set and
/// non-empty) or from `--verbose`.
fn log_targets(env: Option<&str>, verbose: bool) -> Result<Targets, ParseError> {
    match env.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.parse(),
        _ => Ok(default_targets(verbose)),
    }
}

fn default_targets(verbose: bool) -> Targets {
    let targets = Targets::new().with_default(LevelFilter::INFO);
    if verbose {
        targets.with_targets(VERBOSE_TARGETS.map(|target| (target, LevelFilter::DEBUG)))
    } else {
        targets
    }
}

/// When to produce color output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    /// Colorize if the stream is a terminal that supports it.
    #[default]
    Auto,
    /// Always colorize.
    Always,
    /// Never colorize.
    Never,
}

impl Color {
    fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

/// Styles for error messages written to stderr.
#[derive(Debug, Default)]
pub struct StderrStyles {
    pub(crate) bold: Style,
    pub(crate) warning_text: Style,
}

impl StderrStyles {
    fn colorized() -> Self {
        Self {
            bold: style().bold(),
            warning_text: style().yellow(),
        }
    }
}

#[derive(Debug, Default)]
struct LogStyles {
    error: Style,
    warning: Style,
    info: Style,
    debug: Style,
    trace: Style,
    detail: Style,
}

impl LogStyles {
    fn colorized() -> Self {
        Self {
            error: style().red().bold(),
            warning: style().yellow().bold(),
            info: style().bold(),
            debug: style().blue().bold(),
            trace: style().dimmed(),
            detail: style().dimmed(),
        }
    }

    fn heading(&self, level: Level) -> (&'static str, Style) {
        match level {
            Level::ERROR => ("error", self.error),
            Level::WARN => ("warning", self.warning),
            Level::INFO => ("info", self.info),
            Level::DEBUG => ("debug", self.debug),
            Level::TRACE => ("trace", self.trace),
        }
    }
}

/// Formats events as `<level>: <message> key=value ...`.
///
/// Debug and trace events also name their module when targets are shown.
struct LogFormatter {
    styles: LogStyles,
    show_targets: bool,
}

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();

        if metadata.target() != NO_HEADING_TARGET {
            let (heading, style) = self.styles.heading(level);
            write!(writer, "{}: ", heading.style(style))?;
            if self.show_targets && level >= Level::DEBUG {
                let target = format!("[{}]", metadata.target());
                write!(writer, "{} ", target.style(self.styles.detail))?;
            }
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);
        write!(writer, "{}", fields.message)?;
        if !fields.rest.is_empty() {
            write!(writer, " {}", fields.rest.style(self.styles.detail))?;
        }
        writeln!(writer)
    }
}

/// Splits an event into its message and its remaining `key=value` fields.
#[derive(Debug, Default)]
struct EventFields {
    message: String,
    rest: String,
}

impl EventFields {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.rest.is_empty() {
            self.rest.push(' ');
        }
        swrite!(self.rest, "{name}={value}");
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            swrite!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}
