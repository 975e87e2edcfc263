// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use git_version::git_version;
use std::sync::LazyLock;

/// Current git commit hash of the repository.
pub const GIT_HASH: &str =
    git_version!(args = ["--always", "--exclude", "*"], fallback = "unknown");

/// Version of the extractor with git hash embedded, recorded in every vector it produces.
/// E.g., `0.1.0+git.e69baf3e4`
pub static TVX_VERSION_STRING: LazyLock<String> =
    LazyLock::new(|| format!("{}+git.{}", env!("CARGO_PKG_VERSION"), GIT_HASH));
