//! Allocation service
//!
//! Loads snapshot files into an allocation engine and applies batches of edits.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::application::{parse_snapshot, ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{Adjustment, AllocationEngine, AllocationPolicy, AllocationRow, DomainError, SnapshotNode};
use crate::infrastructure::traits::FileSystem;

/// One requested change: which node, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub id: String,
    pub adjustment: Adjustment,
}

impl Edit {
    pub fn absolute(id: impl Into<String>, value: Decimal) -> Self {
        Self {
            id: id.into(),
            adjustment: Adjustment::Absolute(value),
        }
    }

    pub fn percent(id: impl Into<String>, percent: Decimal) -> Self {
        Self {
            id: id.into(),
            adjustment: Adjustment::PercentageDelta(percent),
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.adjustment {
            Adjustment::Absolute(v) => write!(f, "{}={}", self.id, v),
            adjustment => write!(f, "{}={}", self.id, adjustment.to_string().trim_start_matches('=')),
        }
    }
}

/// Rendered state of an allocation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    pub rows: Vec<AllocationRow>,
    pub grand_total: Decimal,
}

impl TryFrom<&AllocationEngine> for AllocationReport {
    type Error = DomainError;

    fn try_from(engine: &AllocationEngine) -> Result<Self, Self::Error> {
        Ok(Self {
            rows: engine.rows(),
            grand_total: engine.grand_total()?,
        })
    }
}

/// Service for loading allocation trees and applying edits.
pub struct AllocationService {
    fs: Arc<dyn FileSystem>,
    policy: AllocationPolicy,
}

impl AllocationService {
    /// Create a new allocation service.
    pub fn new(fs: Arc<dyn FileSystem>, policy: AllocationPolicy) -> Self {
        Self { fs, policy }
    }

    /// Read and parse a snapshot file. An unreadable file is an `OperationFailed`.
    pub fn load_snapshot(&self, path: &Path) -> ApplicationResult<Vec<SnapshotNode>> {
        debug!("load_snapshot: path={}", path.display());
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read snapshot", path)?;
        parse_snapshot(&content, path)
    }

    /// Build an engine from a snapshot file.
    pub fn open(&self, path: &Path) -> ApplicationResult<AllocationEngine> {
        let nodes = self.load_snapshot(path)?;
        let engine = AllocationEngine::with_policy(&nodes, self.policy)?;
        info!("opened {} with {} nodes", path.display(), engine.tree().len());
        Ok(engine)
    }

    /// Apply edits in order. The first rejected edit stops the batch;
    /// edits before it stay applied.
    pub fn apply_all(&self, engine: &mut AllocationEngine, edits: &[Edit]) -> ApplicationResult<()> {
        for edit in edits {
            debug!("apply: {}", edit);
            engine
                .apply(&edit.id, edit.adjustment)
                .map_err(|source| ApplicationError::EditRejected {
                    edit: edit.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Open `path`, apply `edits` and report the resulting tree.
    pub fn run(&self, path: &Path, edits: &[Edit]) -> ApplicationResult<AllocationReport> {
        let mut engine = self.open(path)?;
        self.apply_all(&mut engine, edits)?;
        Ok(AllocationReport::try_from(&engine)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn given_edits_when_displayed_then_use_cli_syntax() {
        assert_eq!(Edit::absolute("electronics", dec!(1600)).to_string(), "electronics=1600");
        assert_eq!(Edit::percent("phones", dec!(10)).to_string(), "phones=+10%");
        assert_eq!(Edit::percent("phones", dec!(-5)).to_string(), "phones=-5%");
    }
}
