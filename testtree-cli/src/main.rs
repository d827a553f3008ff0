// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use std::io::{self, BufWriter};
use testtree_cli::TestTreeApp;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let opts = TestTreeApp::parse();
    let output = opts.init_output();

    let mut stdout = BufWriter::new(io::stdout().lock());
    match opts.exec(output, &mut stdout) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
