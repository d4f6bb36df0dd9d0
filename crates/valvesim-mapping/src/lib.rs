//! Mapping-document pipeline for the ValveSim test-rig simulator.
//!
//! A mapping file enumerates every addressable point of the rig (label,
//! wire address, data-kind code). This crate owns the static-document side
//! of the system:
//!
//! - **[`markup`]**: reader/writer for the tag-based mapping format
//! - **[`mapping_format`]**: flat and structured document loading,
//!   annotation attachment, structure-aware re-flattening
//! - **[`classify`]**: label splitting, section/block resolution, per-unit
//!   subsection extraction
//! - **[`hierarchy`]**: grouping into the fixed Section → Block → Unit tree
//! - **[`emit`]**: canonical structured output with banner comments
//!
//! The live-runtime side (address space, update scheduler) lives in the
//! `valvesim-server` crate and shares the [`model`] types.

pub mod classify;
pub mod emit;
pub mod hierarchy;
pub mod mapping_format;
pub mod markup;
pub mod model;

// Re-exports for convenience
pub use classify::{is_banner_like, resolve_section, resolve_unit, split_label, Block, Section};
pub use emit::{emit_structured, emit_to_string, is_structural_banner};
pub use hierarchy::{group_entries, BlockGroup, GroupedMapping, GroupingReport};
pub use mapping_format::{read_document, read_mapping_file, MappingFileError};
pub use model::{DataKind, MappingDocument, MappingEntry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
