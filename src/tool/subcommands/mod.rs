// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod extract_cmd;

use clap::Parser;

use crate::utils::version::TVX_VERSION_STRING;

/// Command-line options for the `forest-tvx` binary
#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"), author = env!("CARGO_PKG_AUTHORS"), version = TVX_VERSION_STRING.as_str(), about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Subcommand,
}

/// forest-tvx sub-commands
#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Extract a message from the chain into a test vector
    Extract(extract_cmd::ExtractCommand),
}
