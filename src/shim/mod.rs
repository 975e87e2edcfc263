// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Thin layer over the `fvm_shared` v4 and `fvm` v4 types the extractor works with.

pub mod actors;
pub mod address;
pub mod message;
pub mod state_tree;

pub mod clock {
    pub use fvm_shared4::clock::ChainEpoch;
}

pub mod econ {
    pub use fvm_shared4::econ::TokenAmount;
}

pub mod error {
    pub use fvm_shared4::error::ExitCode;
}

pub mod executor {
    pub use fvm_shared4::receipt::Receipt;
}

pub mod version {
    pub use fvm_shared4::version::NetworkVersion;
}
