//! Configuration value types

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

/// Where the plan is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Csv,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" | "file" => Ok(StoreBackend::Csv),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => bail!("Unknown persistence backend '{}' (expected csv or memory)", other),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Csv => write!(f, "csv"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}
