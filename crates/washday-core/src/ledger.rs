//! Append-only history of completed cycles.
//!
//! The ledger keeps insertion order and nothing else. Every ordering or
//! filter is computed at query time over the stored records.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CycleType, WashCycle};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleLedger {
    cycles: Vec<WashCycle>,
}

/// Query-time filter over the ledger. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleFilter {
    pub cycle_type: Option<CycleType>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl CycleFilter {
    pub fn of_type(cycle_type: CycleType) -> Self {
        Self {
            cycle_type: Some(cycle_type),
            ..Self::default()
        }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn matches(&self, cycle: &WashCycle) -> bool {
        let at = cycle.occurred_at();
        self.cycle_type.map_or(true, |t| cycle.cycle_type() == t)
            && self.from.map_or(true, |from| at >= from)
            && self.to.map_or(true, |to| at < to)
    }
}

impl CycleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The only mutator.
    pub(crate) fn append(&mut self, cycle: WashCycle) {
        self.cycles.push(cycle);
    }

    pub(crate) fn clear(&mut self) {
        self.cycles.clear();
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Records in insertion order.
    pub fn cycles(&self) -> &[WashCycle] {
        &self.cycles
    }

    /// Matching records, most recent first. Equal instants keep the later
    /// insertion first.
    pub fn query(&self, filter: &CycleFilter) -> Vec<WashCycle> {
        let mut hits: Vec<WashCycle> = self
            .cycles
            .iter()
            .rev()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()));
        hits
    }

    pub fn recent(&self, limit: usize) -> Vec<WashCycle> {
        let mut all = self.query(&CycleFilter::default());
        all.truncate(limit);
        all
    }

    pub fn count(&self, filter: &CycleFilter) -> usize {
        self.cycles.iter().filter(|c| filter.matches(c)).count()
    }

    /// Matching records grouped by calendar day in `tz`, newest day first.
    pub fn by_day<Tz: TimeZone>(
        &self,
        filter: &CycleFilter,
        tz: &Tz,
    ) -> Vec<(NaiveDate, Vec<WashCycle>)> {
        let mut groups: Vec<(NaiveDate, Vec<WashCycle>)> = Vec::new();
        for cycle in self.query(filter) {
            let day = cycle.occurred_at().with_timezone(tz).date_naive();
            match groups.last_mut() {
                Some((d, cycles)) if *d == day => cycles.push(cycle),
                _ => groups.push((day, vec![cycle])),
            }
        }
        groups
    }
}
