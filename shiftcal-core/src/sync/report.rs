//! Outcome aggregation for a reconciliation pass.

use std::fmt;

use crate::orphan::CollectReport;
use crate::record::SubPeriodIndex;

/// What a pass did for one sub-period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodOutcome {
    /// The linked event still exists
    Skipped,
    /// An existing event was adopted
    Repaired(String),
    /// A new event was inserted
    Created(String),
}

impl PeriodOutcome {
    /// The id to store in the link, when it changed.
    pub fn new_link(&self) -> Option<&str> {
        match self {
            PeriodOutcome::Skipped => None,
            PeriodOutcome::Repaired(id) | PeriodOutcome::Created(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodCounts {
    pub skipped: usize,
    pub repaired: usize,
    pub created: usize,
}

impl PeriodCounts {
    fn add(&mut self, outcome: &PeriodOutcome) {
        match outcome {
            PeriodOutcome::Skipped => self.skipped += 1,
            PeriodOutcome::Repaired(_) => self.repaired += 1,
            PeriodOutcome::Created(_) => self.created += 1,
        }
    }
}

/// A record the pass could not fully reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub record_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub part1: PeriodCounts,
    pub part2: PeriodCounts,
    /// Records whose link metadata was written
    pub links_written: usize,
    pub failures: Vec<RecordFailure>,
    /// Set when orphan collection ran
    pub orphans: Option<CollectReport>,
}

impl SyncReport {
    pub fn counts(&self, index: SubPeriodIndex) -> &PeriodCounts {
        match index {
            SubPeriodIndex::First => &self.part1,
            SubPeriodIndex::Second => &self.part2,
        }
    }

    pub(crate) fn record(&mut self, index: SubPeriodIndex, outcome: &PeriodOutcome) {
        match index {
            SubPeriodIndex::First => self.part1.add(outcome),
            SubPeriodIndex::Second => self.part2.add(outcome),
        }
    }

    pub(crate) fn fail(&mut self, record_id: &str, message: String) {
        // One entry per record, keeping the first error
        if self.failures.iter().any(|f| f.record_id == record_id) {
            return;
        }
        self.failures.push(RecordFailure {
            record_id: record_id.to_string(),
            message,
        });
    }

    pub fn skipped(&self) -> usize {
        self.part1.skipped + self.part2.skipped
    }

    pub fn repaired(&self) -> usize {
        self.part1.repaired + self.part2.repaired
    }

    pub fn created(&self) -> usize {
        self.part1.created + self.part2.created
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn orphans_deleted(&self) -> usize {
        self.orphans.as_ref().map_or(0, |o| o.deleted)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} skipped, {} repaired, {} created",
            self.skipped(),
            self.repaired(),
            self.created()
        )?;
        if let Some(orphans) = &self.orphans {
            write!(f, ", {} orphans deleted", orphans.deleted)?;
        }
        if !self.failures.is_empty() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        Ok(())
    }
}
