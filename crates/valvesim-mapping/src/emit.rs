//! Structured emission of a grouped mapping.
//!
//! Output order is canonical and input-order independent: the global list
//! first, then sections in [`Section::ALL`] order, blocks `Block1..Block4`,
//! ungrouped entries before unit subsections, units ascending `Unit1..16`.
//! Section, block and unit boundaries carry comment banners bracketed by a
//! line of 168 `=` characters.

use std::collections::BTreeMap;

use crate::classify::{is_banner_like, Block, Section, MAX_UNIT};
use crate::hierarchy::{BlockGroup, GroupedMapping};
use crate::markup::{render, Element, Node};
use crate::model::MappingEntry;

/// Width of the banner delimiter line.
pub const BANNER_WIDTH: usize = 168;

/// Banner title of the global list.
pub const GLOBAL_TITLE: &str = "Globale Daten";

/// Whether a comment is one of the banners this emitter generates. The
/// structure-aware flattener skips exactly these, and annotations matching
/// them are suppressed so a re-emitted document never duplicates a banner.
pub fn is_structural_banner(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.contains("===") || trimmed == GLOBAL_TITLE {
        return true;
    }
    if Block::ALL.iter().any(|block| block.key() == trimmed) {
        return true;
    }
    if Section::ALL.iter().any(|section| section.title() == trimmed) {
        return true;
    }
    // Unit title comments: "Unit <digits>".
    if let Some(rest) = trimmed.strip_prefix("Unit ") {
        return !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit());
    }
    false
}

/// Whether an annotation is withheld from the structured output.
fn suppress_annotation(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || is_banner_like(trimmed) || is_structural_banner(trimmed)
}

/// Build the structured document tree for a grouped mapping.
pub fn emit_structured(namespace_uris: &[String], grouped: &GroupedMapping) -> Element {
    warn_out_of_range_units(grouped);

    let mut root = Element::new("DataMapping");

    // Namespace declarations are copied through unchanged.
    if !namespace_uris.is_empty() {
        let mut uris = Element::new("NamespaceUris");
        for uri in namespace_uris {
            uris.push(Node::Element(Element::new("Uri").with_text(uri.clone())));
        }
        root.push(Node::Element(uris));
    }

    let mut mappings = Element::new("Mappings");

    if !grouped.global.is_empty() {
        push_banner(&mut mappings.children, GLOBAL_TITLE);
        for entry in &grouped.global {
            // Global entries carry no annotations in the structured form.
            mappings.push(Node::Element(entry_element(entry)));
        }
    }

    for section in Section::ALL {
        let Some(blocks) = grouped.sections.get(&section) else {
            continue;
        };
        if blocks.values().all(BlockGroup::is_empty) {
            continue;
        }
        push_banner(&mut mappings.children, &section.title());
        let mut section_el = Element::new(section.key());

        for block in Block::ALL {
            let Some(group) = blocks.get(&block) else {
                continue;
            };
            if group.is_empty() {
                continue;
            }
            push_banner(&mut section_el.children, block.key());
            section_el.push(Node::Element(block_element(block, group)));
        }
        mappings.push(Node::Element(section_el));
    }

    root.push(Node::Element(mappings));
    root
}

/// Render the structured document to its canonical text form.
pub fn emit_to_string(namespace_uris: &[String], grouped: &GroupedMapping) -> String {
    render(&emit_structured(namespace_uris, grouped))
}

fn block_element(block: Block, group: &BlockGroup) -> Element {
    let mut block_el = Element::new(block.key());

    // Ungrouped entries come first, each preceded by its annotation unless
    // that would duplicate a banner.
    for entry in &group.ungrouped {
        if let Some(annotation) = &entry.annotation {
            if !suppress_annotation(annotation) {
                block_el.push(Node::Comment(format!(" {} ", annotation.trim())));
            }
        }
        block_el.push(Node::Element(entry_element(entry)));
    }

    for unit in 1..=MAX_UNIT {
        let Some(entries) = group.units.get(&unit) else {
            continue;
        };
        let mut unit_el = Element::new(format!("Unit{unit}"));
        unit_el.push(Node::Comment(format!(" Unit {unit} ")));
        for entry in entries {
            unit_el.push(Node::Element(entry_element(entry)));
        }
        block_el.push(Node::Element(unit_el));
    }

    block_el
}

/// Log every unit bucket the output will not carry. Runs over the whole
/// tree, including blocks that end up skipped as empty.
fn warn_out_of_range_units(grouped: &GroupedMapping) {
    for group in grouped.sections.values().flat_map(BTreeMap::values) {
        for (&unit, entries) in &group.units {
            if !(1..=MAX_UNIT).contains(&unit) {
                tracing::warn!(
                    unit,
                    entries = entries.len(),
                    "unit index outside 1..={} excluded from structured output",
                    MAX_UNIT
                );
            }
        }
    }
}

fn entry_element(entry: &MappingEntry) -> Element {
    Element::new("Mapping")
        .with_attr("Label", entry.label.clone())
        .with_attr("NodeId", entry.node_id.clone())
        .with_attr("DataTypeId", entry.data_kind.code())
}

fn push_banner(children: &mut Vec<Node>, title: &str) {
    let delimiter = format!("\n{}\n", "=".repeat(BANNER_WIDTH));
    children.push(Node::Comment(delimiter.clone()));
    children.push(Node::Comment(format!(" {title} ")));
    children.push(Node::Comment(delimiter));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::group_entries;
    use crate::model::{DataKind, MappingEntry};

    fn entry(label: &str, id: u32) -> MappingEntry {
        MappingEntry::new(label, format!("ns=1;i={id}"), DataKind::Double)
    }

    #[test]
    fn test_structural_banner_predicate() {
        assert!(is_structural_banner(&format!("\n{}\n", "=".repeat(168))));
        assert!(is_structural_banner(" Block2 "));
        assert!(is_structural_banner(" Globale Daten "));
        assert!(is_structural_banner(" DB Kommandos 1-4 "));
        assert!(is_structural_banner(" Unit 12 "));
        assert!(!is_structural_banner(" Unit x "));
        assert!(!is_structural_banner(" Zykluszeit aktueller Test "));
    }

    #[test]
    fn test_sections_emitted_in_canonical_order() {
        // Input deliberately reversed relative to canonical order.
        let report = group_entries(vec![
            entry("Block1.DB_Kommandos.Start", 1),
            entry("Block1.DB_AllgemeineParameter.Zykluszeit", 2),
        ]);
        let output = emit_to_string(&[], &report.grouped);
        let params = output.find("DB_AllgemeineParameter_1-4").unwrap();
        let commands = output.find("DB_Kommandos_1-4").unwrap();
        assert!(params < commands);
    }

    #[test]
    fn test_units_ascending_and_range_enforced() {
        let report = group_entries(vec![
            entry("Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext9.Strom", 1),
            entry("Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext2.Strom", 2),
            entry("Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext17.Strom", 3),
        ]);
        let output = emit_to_string(&[], &report.grouped);
        let unit2 = output.find("<Unit2>").unwrap();
        let unit9 = output.find("<Unit9>").unwrap();
        assert!(unit2 < unit9);
        // Bucket 17 exists in the grouping but never reaches the output.
        assert!(output.find("Unit17").is_none());
        assert!(output.find("Ext17").is_none());
    }

    #[test]
    fn test_global_first_with_banner() {
        let report = group_entries(vec![
            entry("Block1.DB_Kommandos.Start", 1),
            entry("DB_GlobalData.Version", 2),
        ]);
        let output = emit_to_string(&[], &report.grouped);
        let global = output.find("Globale Daten").unwrap();
        let commands = output.find("DB_Kommandos_1-4").unwrap();
        assert!(global < commands);
        assert!(output.contains(&"=".repeat(BANNER_WIDTH)));
    }

    #[test]
    fn test_annotation_emitted_unless_banner_like() {
        let report = group_entries(vec![
            entry("Block1.DB_Kommandos.Start", 1).with_annotation("Startkommando Prüfablauf"),
            entry("Block1.DB_Kommandos.Stop", 2).with_annotation("==== Block1 ===="),
        ]);
        let output = emit_to_string(&[], &report.grouped);
        assert!(output.contains("<!-- Startkommando Prüfablauf -->"));
        assert!(!output.contains("==== Block1 ===="));
    }

    #[test]
    fn test_empty_sections_omitted() {
        let report = group_entries(vec![entry("Block3.DB_Kommandos.Start", 1)]);
        let output = emit_to_string(&[], &report.grouped);
        assert!(!output.contains("DB_AllgemeineParameter_1-4"));
        assert!(!output.contains("<Block1>"));
        assert!(output.contains("<Block3>"));
    }

    #[test]
    fn test_namespace_block_copied_through() {
        let report = group_entries(vec![entry("Block1.DB_Kommandos.Start", 1)]);
        let uris = vec!["urn:valvesim:sps".to_string()];
        let output = emit_to_string(&uris, &report.grouped);
        assert!(output.contains("<Uri>urn:valvesim:sps</Uri>"));
    }
}
