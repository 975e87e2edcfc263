// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use fvm_shared4::address::{Address, Network, Protocol};

/// Parses an address written with either the mainnet (`f`) or testnet (`t`) prefix.
pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    Network::Mainnet
        .parse_address(s)
        .or_else(|_| Network::Testnet.parse_address(s))
        .map_err(|e| anyhow::anyhow!("invalid address {s}: {e}"))
}
