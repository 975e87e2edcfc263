// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod blocks;
mod cli_shared;
mod db;
mod interpreter;
mod lotus_json;
mod rpc_client;
mod shim;
#[cfg(test)]
mod test_utils;
mod tool;
mod tvx;
mod utils;

pub use tool::main::main as forest_tvx_main;
