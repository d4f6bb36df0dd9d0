//! Grouping of flat mapping entries into the canonical
//! Section → Block → optional Unit hierarchy.
//!
//! The tree depth is fixed and encoded in the types: ordering and
//! completeness fall out of the `BTreeMap` key order (enum declaration
//! order) instead of emission-time special cases.

use std::collections::BTreeMap;

use crate::classify::{
    resolve_section, resolve_unit, split_label, Block, Section, GLOBAL_PREFIX, MAX_UNIT,
};
use crate::model::MappingEntry;

/// Entries of one block: ungrouped first, then per-unit buckets keyed by
/// the raw extracted index (bound enforcement happens at emission).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockGroup {
    pub ungrouped: Vec<MappingEntry>,
    pub units: BTreeMap<u32, Vec<MappingEntry>>,
}

impl BlockGroup {
    /// Whether the block contributes nothing to the structured output.
    /// Unit buckets outside `1..=MAX_UNIT` never reach the output, so a
    /// block holding only those is empty for emission purposes.
    pub fn is_empty(&self) -> bool {
        self.ungrouped.is_empty() && !self.has_units()
    }

    /// Whether any entries landed in an emittable per-unit subsection.
    pub fn has_units(&self) -> bool {
        self.units.keys().any(|&unit| (1..=MAX_UNIT).contains(&unit))
    }
}

/// The grouped mapping: global entries plus the section tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedMapping {
    /// Entries with the reserved global prefix, in input order.
    pub global: Vec<MappingEntry>,
    pub sections: BTreeMap<Section, BTreeMap<Block, BlockGroup>>,
}

impl GroupedMapping {
    /// Total number of grouped entries (global included).
    pub fn len(&self) -> usize {
        let grouped: usize = self
            .sections
            .values()
            .flat_map(|blocks| blocks.values())
            .map(|group| {
                group.ungrouped.len() + group.units.values().map(Vec::len).sum::<usize>()
            })
            .sum();
        self.global.len() + grouped
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a grouping run: the tree plus the labels that failed
/// classification and were filtered out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingReport {
    pub grouped: GroupedMapping,
    /// Labels dropped because section or block could not be resolved.
    pub dropped: Vec<String>,
}

/// Group entries in input order. Classification failures are filtered, not
/// errors: dropping unresolvable points is the intended behavior of the
/// format, but the count is surfaced for observability.
pub fn group_entries<I>(entries: I) -> GroupingReport
where
    I: IntoIterator<Item = MappingEntry>,
{
    let mut report = GroupingReport::default();

    for entry in entries {
        if entry.label.starts_with(GLOBAL_PREFIX) {
            report.grouped.global.push(entry);
            continue;
        }

        let parts = split_label(&entry.label);
        let section = parts
            .database
            .and_then(|db| resolve_section(db, &entry.label));
        let block = parts.block.and_then(Block::parse);

        let (Some(section), Some(block)) = (section, block) else {
            tracing::debug!(label = %entry.label, "entry failed section/block classification");
            report.dropped.push(entry.label);
            continue;
        };

        let group = report
            .grouped
            .sections
            .entry(section)
            .or_default()
            .entry(block)
            .or_default();
        match resolve_unit(&entry.label) {
            Some(unit) => group.units.entry(unit).or_default().push(entry),
            None => group.ungrouped.push(entry),
        }
    }

    if !report.dropped.is_empty() {
        tracing::warn!(
            dropped = report.dropped.len(),
            "entries were filtered out during grouping"
        );
    }
    report
}
