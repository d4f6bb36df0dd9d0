//! Reading mapping documents.
//!
//! Both file shapes are accepted by the same reader: the flat form (all
//! `Mapping` elements directly under `Mappings`, annotation comments in
//! between) and the structured form this crate emits (sections, blocks,
//! unit subsections). Reading the structured form is the structure-aware
//! re-flattening: entries are collected in document order, emitter banners
//! are skipped, everything else becomes the pending annotation for the
//! next entry.

use std::path::Path;

use thiserror::Error;

use crate::emit::is_structural_banner;
use crate::markup::{parse, Element, MarkupError, Node};
use crate::model::{DataKind, MappingDocument, MappingEntry};

/// Errors raised while loading a mapping file.
#[derive(Debug, Error)]
pub enum MappingFileError {
    #[error("failed to read mapping file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed mapping file: {0}")]
    Markup(#[from] MarkupError),

    #[error("missing <Mappings> container")]
    MissingMappings,
}

/// Parse mapping document text (flat or structured).
pub fn read_document(input: &str) -> Result<MappingDocument, MappingFileError> {
    let root = parse(input)?;

    let namespace_uris = root
        .child("NamespaceUris")
        .map(|uris| {
            uris.children
                .iter()
                .filter_map(|node| match node {
                    Node::Element(el) if el.name == "Uri" => {
                        Some(el.text.clone().unwrap_or_default())
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let mappings = root
        .child("Mappings")
        .ok_or(MappingFileError::MissingMappings)?;

    let mut entries = Vec::new();
    let mut pending: Option<String> = None;
    collect_entries(mappings, &mut pending, &mut entries);

    Ok(MappingDocument {
        namespace_uris,
        entries,
    })
}

/// Load and parse a mapping file from disk.
pub fn read_mapping_file(path: impl AsRef<Path>) -> Result<MappingDocument, MappingFileError> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path)?;
    let doc = read_document(&input)?;
    tracing::info!(
        path = %path.display(),
        entries = doc.entries.len(),
        "loaded mapping file"
    );
    Ok(doc)
}

fn collect_entries(el: &Element, pending: &mut Option<String>, entries: &mut Vec<MappingEntry>) {
    for node in &el.children {
        match node {
            Node::Comment(text) => {
                if is_structural_banner(text) {
                    *pending = None;
                } else {
                    // A comment annotates the next entry only; each one
                    // replaces the previous pending annotation.
                    *pending = Some(text.trim().to_string());
                }
            }
            Node::Element(child) if child.name == "Mapping" => {
                let mut entry = MappingEntry::new(
                    child.attr("Label").unwrap_or_default(),
                    child.attr("NodeId").unwrap_or_default(),
                    DataKind::from_code(child.attr("DataTypeId").unwrap_or_default()),
                );
                entry.annotation = pending.take().filter(|text| !text.is_empty());
                entries.push(entry);
            }
            // Section, block and unit elements of the structured form.
            Node::Element(child) => collect_entries(child, pending, entries),
        }
    }
}
