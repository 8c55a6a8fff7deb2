use serde::{Deserialize, Serialize};

use crate::errors::{EscrowError, Result};

/// Minor units per major unit (fixed-point scale 10^6)
pub const MINOR_UNITS_PER_MAJOR: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    Transfer,
}

/// A value transfer for an external wallet to sign and broadcast.
///
/// The service never signs; it only describes the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnsignedInstruction {
    pub kind: InstructionKind,
    pub destination: String,
    /// Amount in minor units
    pub amount: u64,
}

impl UnsignedInstruction {
    pub fn transfer(destination: impl Into<String>, amount: u64) -> Self {
        Self {
            kind: InstructionKind::Transfer,
            destination: destination.into(),
            amount,
        }
    }
}

/// Convert a user-facing major-unit amount to minor units, rounding to the
/// nearest integer.
pub fn to_minor_units(major: f64) -> Result<u64> {
    if !major.is_finite() {
        return Err(EscrowError::validation("amount", "must be a finite number"));
    }
    if major < 0.0 {
        return Err(EscrowError::validation("amount", "must not be negative"));
    }
    let scaled = (major * MINOR_UNITS_PER_MAJOR as f64).round();
    if scaled >= u64::MAX as f64 {
        return Err(EscrowError::validation("amount", "is too large"));
    }
    Ok(scaled as u64)
}
