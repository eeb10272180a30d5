//! Size units for user-entered partition sizes
//!
//! The wizard shows sizes as a value plus a binary unit, the wire formats carry
//! plain byte counts. Conversions go through `f64` so that `to_bytes(from_bytes(n))`
//! is exact for every byte count below 2^53 (division by a power of two never
//! loses precision there).

use serde::{Deserialize, Serialize};
use std::fmt;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Binary size unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    KiB,
    MiB,
    GiB,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::KiB, Unit::MiB, Unit::GiB];

    /// Number of bytes in one of this unit
    pub fn factor(self) -> u64 {
        match self {
            Unit::KiB => KIB,
            Unit::MiB => MIB,
            Unit::GiB => GIB,
        }
    }

    /// Largest unit that divides `bytes` exactly, `MiB` when none does.
    pub fn preferred_for(bytes: u64) -> Unit {
        if bytes == 0 {
            return Unit::MiB;
        }
        [Unit::GiB, Unit::MiB, Unit::KiB]
            .into_iter()
            .find(|unit| bytes % unit.factor() == 0)
            .unwrap_or(Unit::MiB)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::KiB => "KiB",
            Unit::MiB => "MiB",
            Unit::GiB => "GiB",
        };
        f.write_str(s)
    }
}

/// Convert a user-entered size to bytes.
///
/// Negative and NaN sizes saturate to zero.
pub fn to_bytes(size: f64, unit: Unit) -> u64 {
    (size * unit.factor() as f64).round() as u64
}

/// Convert a byte count to a value in `unit`
pub fn from_bytes(bytes: u64, unit: Unit) -> f64 {
    bytes as f64 / unit.factor() as f64
}

/// Parse a size as written in on-prem blueprints.
///
/// Accepts a bare byte count (`"1073741824"`) or a number followed by a unit
/// (`"20 GiB"`, `"512MiB"`, `"1 GB"`). Decimal suffixes use powers of 1000.
pub fn parse_size(input: &str) -> Option<u64> {
    let input = input.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, suffix) = input.split_at(split);
    let value: f64 = number.parse().ok()?;

    let multiplier: u64 = match suffix.trim() {
        "" | "B" => 1,
        "KiB" => KIB,
        "MiB" => MIB,
        "GiB" => GIB,
        "TiB" => 1024 * GIB,
        "kB" | "KB" => 1_000,
        "MB" => 1_000_000,
        "GB" => 1_000_000_000,
        "TB" => 1_000_000_000_000,
        _ => return None,
    };

    Some((value * multiplier as f64).round() as u64)
}
