// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use base64::engine::{Engine as _, general_purpose::STANDARD};
use itertools::Itertools as _;

use crate::shim::executor::Receipt;

/// Outcome of comparing the local receipt against the chain's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReceiptCheck {
    Matched,
    /// The chain returned no receipt, so nothing was compared.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMismatch {
    ExitCode { expected: u32, actual: u32 },
    Return { expected: Vec<u8>, actual: Vec<u8> },
    GasUsed { expected: u64, actual: u64 },
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode { expected, actual } => {
                write!(f, "exit code: expected {expected}, got {actual}")
            }
            Self::Return { expected, actual } => write!(
                f,
                "return value: expected {:?}, got {:?}",
                STANDARD.encode(expected),
                STANDARD.encode(actual)
            ),
            Self::GasUsed { expected, actual } => {
                write!(f, "gas used: expected {expected}, got {actual}")
            }
        }
    }
}

/// Every field in which the local receipt differs from the chain's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptMismatch(pub Vec<FieldMismatch>);

impl fmt::Display for ReceiptMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("; "))
    }
}

/// Compares exit code, return value and gas used. Events are not compared.
pub fn check_receipt(
    expected: Option<&Receipt>,
    actual: &Receipt,
) -> Result<ReceiptCheck, ReceiptMismatch> {
    let Some(expected) = expected else {
        return Ok(ReceiptCheck::Skipped);
    };
    let mut mismatches = vec![];
    if expected.exit_code != actual.exit_code {
        mismatches.push(FieldMismatch::ExitCode {
            expected: expected.exit_code.value(),
            actual: actual.exit_code.value(),
        });
    }
    if expected.return_data != actual.return_data {
        mismatches.push(FieldMismatch::Return {
            expected: expected.return_data.to_vec(),
            actual: actual.return_data.to_vec(),
        });
    }
    if expected.gas_used != actual.gas_used {
        mismatches.push(FieldMismatch::GasUsed {
            expected: expected.gas_used,
            actual: actual.gas_used,
        });
    }
    if mismatches.is_empty() {
        Ok(ReceiptCheck::Matched)
    } else {
        Err(ReceiptMismatch(mismatches))
    }
}
