// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::ffi::OsString;

use clap::Parser as _;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::subcommands::{Cli, Subcommand};
use crate::cli_shared::logger::setup_logger;

pub fn main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> anyhow::Result<()>
where
    ArgT: Into<OsString> + Clone,
{
    // Capture Cli inputs
    let Cli { cmd } = Cli::parse_from(args);
    setup_logger();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("interrupted; stopping at the next stage boundary");
                        cancel.cancel();
                    }
                }
            });
            // Run command
            match cmd {
                Subcommand::Extract(cmd) => cmd.run(cancel).await,
            }
        })
}
