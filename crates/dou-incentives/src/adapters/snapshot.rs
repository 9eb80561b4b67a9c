//! JSON Lines snapshots of the reward ledger and validator registry
//!
//! One record per line:
//!
//! ```text
//! ledger:   {"address":"alice","cumulative_reward":0.25}     sorted by address
//! registry: {"address":"val","stake":150.0,"join_time":1700000000000}   registration order
//! ```
//!
//! Blank lines are skipped on read.

use crate::domain::{RewardLedger, Validator, ValidatorRegistry};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared_types::Address;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Snapshot codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid snapshot record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// One reward ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub address: Address,
    pub cumulative_reward: f64,
}

/// Write every balance, sorted by address. Returns the record count.
pub fn write_ledger_snapshot<W: Write>(
    ledger: &RewardLedger,
    mut writer: W,
) -> Result<usize, SnapshotError> {
    let records: Vec<LedgerRecord> = ledger
        .balances()
        .into_iter()
        .map(|(address, cumulative_reward)| LedgerRecord {
            address,
            cumulative_reward,
        })
        .collect();
    write_lines(&records, &mut writer)
}

pub fn read_ledger_snapshot<R: BufRead>(reader: R) -> Result<Vec<LedgerRecord>, SnapshotError> {
    read_lines(reader, |line, record: &LedgerRecord| {
        check_address(line, &record.address)?;
        if !record.cumulative_reward.is_finite() {
            return Err(invalid(line, "cumulative_reward is not finite"));
        }
        Ok(())
    })
}

/// Write every validator in registry order. Returns the record count.
pub fn write_registry_snapshot<W: Write>(
    registry: &ValidatorRegistry,
    mut writer: W,
) -> Result<usize, SnapshotError> {
    write_lines(&registry.snapshot(), &mut writer)
}

pub fn read_registry_snapshot<R: BufRead>(reader: R) -> Result<Vec<Validator>, SnapshotError> {
    read_lines(reader, |line, validator: &Validator| {
        check_address(line, validator.address())?;
        let stake = validator.stake();
        if !stake.is_finite() || stake < 0.0 {
            return Err(invalid(line, "stake must be finite and non-negative"));
        }
        Ok(())
    })
}

fn write_lines<T: Serialize, W: Write>(records: &[T], writer: &mut W) -> Result<usize, SnapshotError> {
    for (index, record) in records.iter().enumerate() {
        serde_json::to_writer(&mut *writer, record).map_err(|source| SnapshotError::Malformed {
            line: index + 1,
            source,
        })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

fn read_lines<T, R, F>(reader: R, check: F) -> Result<Vec<T>, SnapshotError>
where
    T: DeserializeOwned,
    R: BufRead,
    F: Fn(usize, &T) -> Result<(), SnapshotError>,
{
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = index + 1;
        let record: T = serde_json::from_str(&line).map_err(|source| SnapshotError::Malformed {
            line: number,
            source,
        })?;
        check(number, &record)?;
        records.push(record);
    }
    Ok(records)
}

fn check_address(line: usize, address: &Address) -> Result<(), SnapshotError> {
    if address.is_empty() {
        Err(invalid(line, "empty address"))
    } else {
        Ok(())
    }
}

fn invalid(line: usize, reason: &str) -> SnapshotError {
    SnapshotError::InvalidRecord {
        line,
        reason: reason.to_string(),
    }
}
